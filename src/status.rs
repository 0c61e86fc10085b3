// Working-folder status — which artifacts exist, how large they are, and
// what the persisted model was trained with.

use anyhow::Result;
use colored::Colorize;

use crate::layout::WorkspaceLayout;
use crate::topics::report::load_model;

/// Display working-folder status to the terminal.
pub fn show(layout: &WorkspaceLayout) -> Result<()> {
    if !layout.root().exists() {
        println!("Working folder: {} (missing)", layout.root().display());
        println!("\nCreate it and place the source file inside, then run `topicmill prepare`.");
        return Ok(());
    }
    println!("Working folder: {}", layout.root().display());

    for (label, path) in layout.artifacts() {
        match std::fs::metadata(&path) {
            Ok(meta) => println!(
                "  {:<26} {} ({})",
                label,
                path.display(),
                format_bytes(meta.len())
            ),
            Err(_) => println!("  {:<26} {}", label, "not yet generated".dimmed()),
        }
    }

    if layout.model().exists() {
        let model = load_model(&layout.model())?;
        println!(
            "Model: {} topics, {} words, {} iterations (trained {})",
            model.topic_count,
            model.vocabulary.len(),
            model.iterations,
            model.trained_at.format("%Y-%m-%d %H:%M UTC")
        );
    } else {
        println!("Model: not yet trained");
        println!("  Run `topicmill train -f <file> -n <topics>` to build it");
    }

    Ok(())
}

pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_show_on_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        show(&WorkspaceLayout::new(dir.path())).unwrap();
        show(&WorkspaceLayout::new(dir.path().join("absent"))).unwrap();
    }
}
