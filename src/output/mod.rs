// Output formatting — terminal display of run summaries and topic results.

pub mod terminal;

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Respects UTF-8 character boundaries, so multi-byte words never panic.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    let char_count = text.chars().count();
    if char_count <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// A fixed-width `[====    ]` bar for a value in `0.0..=1.0`.
pub fn proportion_bar(value: f64, width: usize) -> String {
    let filled = ((value.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("[{}{}]", "=".repeat(filled), " ".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("café au lait", 4), "café...");
    }

    #[test]
    fn test_proportion_bar() {
        assert_eq!(proportion_bar(0.5, 4), "[==  ]");
        assert_eq!(proportion_bar(1.7, 3), "[===]");
        assert_eq!(proportion_bar(-0.2, 2), "[  ]");
    }
}
