// Word list loading for the stop-word and "other words" files.
//
// One entry per line, either a plain word or a regex alternation such as
// `the|a`. Blank lines and lines starting with `#` are ignored.
// A missing file is not an error: it is logged and yields an empty list,
// which the normalizer turns into a matcher that removes nothing.

use std::path::Path;

use anyhow::{Context, Result};
use stop_words::{get, LANGUAGE};
use tracing::{info, warn};

/// Parse word list contents into trimmed terms.
pub fn parse_word_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Load a word list from disk. Missing files produce an empty list.
pub fn load_word_list(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        warn!(path = %path.display(), "Word list not found, nothing will be removed for it");
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read word list {}", path.display()))?;
    let words = parse_word_list(&contents);
    info!(path = %path.display(), words = words.len(), "Loaded word list");
    Ok(words)
}

/// Append the stop-words crate's English list to `words`, skipping terms
/// already present. Built-in terms are plain words, so they are escaped
/// before joining the pattern-fragment list.
pub fn extend_with_builtin_english(words: &mut Vec<String>) {
    let builtin: Vec<String> = get(LANGUAGE::English);
    let before = words.len();
    for word in builtin {
        let word = regex_lite::escape(&word.trim().to_lowercase());
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    }
    info!(added = words.len() - before, "Merged built-in English stop words");
}
