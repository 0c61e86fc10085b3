// Text normalizer — turns a raw field value into a canonical token stream.
//
// The pipeline is ordered and every step replaces what it removes with a
// single space, so later steps see the same word boundaries the earlier
// ones left behind:
//
//   1. stop words (whole word, case-insensitive)
//   2. "other words" (same rules)
//   3. scheme-prefixed URLs
//   4. email-like tokens
//   5. digit runs
//   6. ASCII punctuation and the pound sign
//   7. single-character tokens (inner twice, then leading, then trailing)
//   8. whitespace collapse + trim
//
// All matchers are compiled once in `Normalizer::new` and reused for every
// record of a run.

use std::path::Path;

use anyhow::{Context, Result};
use regex_lite::Regex;
use tracing::warn;

use super::frequency::WordFrequencyTable;
use super::wordlist;

const URL_PATTERN: &str =
    r"(?i)(?:https?|ftp|gopher|telnet|file|unsure):(?://|\\)+[\w:#@%/;$()~?+,\-.<=\\&]*";
const EMAIL_PATTERN: &str = r"[a-zA-Z0-9=*!$&_.+\-]+@[a-zA-Z0-9\-]+\.[a-zA-Z0-9.\-]+";
const DIGITS_PATTERN: &str = r"\d+";
const PUNCTUATION_PATTERN: &str = r"[!-/:-@\[-`{-~]";
const INNER_SINGLE_PATTERN: &str = r"\s\w\s";
const LEADING_SINGLE_PATTERN: &str = r"^\w\s";
const TRAILING_SINGLE_PATTERN: &str = r"\s\w$";
const WHITESPACE_PATTERN: &str = r"\s+";

/// Precompiled cleaning pipeline for one run.
#[derive(Debug, Clone)]
pub struct Normalizer {
    stop_words: Option<Regex>,
    other_words: Option<Regex>,
    url: Regex,
    email: Regex,
    digits: Regex,
    punctuation: Regex,
    inner_single: Regex,
    leading_single: Regex,
    trailing_single: Regex,
    whitespace: Regex,
}

impl Normalizer {
    /// Build a normalizer from in-memory stop-word and other-word lists.
    ///
    /// Empty lists (or lists whose alternation fails to compile) produce a
    /// step that removes nothing.
    pub fn new(stop_words: &[String], other_words: &[String]) -> Result<Self> {
        Ok(Self {
            stop_words: word_alternation(stop_words, "stop words"),
            other_words: word_alternation(other_words, "other words"),
            url: compile(URL_PATTERN)?,
            email: compile(EMAIL_PATTERN)?,
            digits: compile(DIGITS_PATTERN)?,
            punctuation: compile(PUNCTUATION_PATTERN)?,
            inner_single: compile(INNER_SINGLE_PATTERN)?,
            leading_single: compile(LEADING_SINGLE_PATTERN)?,
            trailing_single: compile(TRAILING_SINGLE_PATTERN)?,
            whitespace: compile(WHITESPACE_PATTERN)?,
        })
    }

    /// Build a normalizer from word list files. Missing files count as empty lists.
    pub fn from_files(stop_words_path: &Path, other_words_path: &Path) -> Result<Self> {
        let stop_words = wordlist::load_word_list(stop_words_path)?;
        let other_words = wordlist::load_word_list(other_words_path)?;
        Self::new(&stop_words, &other_words)
    }

    /// Clean `text` and record every resulting token in `frequencies`.
    ///
    /// Returns the cleaned string, not the token list. Text that cleans down
    /// to nothing still records one empty token.
    pub fn normalize(&self, text: &str, frequencies: &mut WordFrequencyTable) -> String {
        let cleaned = self.clean(text);
        for word in cleaned.split(' ') {
            frequencies.record(word);
        }
        cleaned
    }

    /// Run the cleaning steps without touching any frequency table.
    pub fn clean(&self, text: &str) -> String {
        let mut value = text.to_string();

        if let Some(stop_words) = &self.stop_words {
            value = stop_words.replace_all(&value, " ").into_owned();
        }
        if let Some(other_words) = &self.other_words {
            value = other_words.replace_all(&value, " ").into_owned();
        }

        value = self.url.replace_all(&value, " ").into_owned();
        value = self.email.replace_all(&value, " ").into_owned();
        value = self.digits.replace_all(&value, " ").into_owned();
        value = self.punctuation.replace_all(&value, " ").into_owned();
        value = value.trim().replace('£', " ");

        // The inner pass runs twice: "a b c" leaves " b " behind after
        // the first pass consumes the shared space.
        value = self.inner_single.replace_all(&value, " ").into_owned();
        value = self.inner_single.replace_all(&value, " ").into_owned();
        value = self.leading_single.replace_all(&value, " ").into_owned();
        value = self.trailing_single.replace_all(&value, " ").into_owned();

        self.whitespace.replace_all(value.trim(), " ").into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid built-in pattern {pattern}"))
}

/// Compile `\b(?:e1|e2|...)\b\s*` for a word list, or `None` when there is
/// nothing to match.
///
/// Each entry is a pattern fragment, so a line such as `the|a` contributes
/// two alternatives. A list that fails to compile removes nothing.
fn word_alternation(words: &[String], kind: &str) -> Option<Regex> {
    let fragments: Vec<&str> = words
        .iter()
        .map(|w| w.trim())
        .filter(|w| !w.is_empty())
        .collect();

    if fragments.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i)\b(?:{})\b\s*", fragments.join("|"));
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(error = %e, entries = fragments.len(), "Could not compile {kind}, skipping removal");
            None
        }
    }
}
