// WordFrequencyTable — occurrence counts for every normalized token seen
// during one corpus pass.
//
// One table is created per run and threaded through every normalize call
// by mutable reference. It is never stored globally, so two runs in the same
// process never see each other's counts.

use std::collections::HashMap;

/// Token -> occurrence count.
#[derive(Debug, Default, Clone)]
pub struct WordFrequencyTable {
    counts: HashMap<String, u64>,
}

impl WordFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment `word` by one, creating it at 1 if absent.
    ///
    /// The empty string is a legal key: normalizing text that cleans down to
    /// nothing still records one empty token.
    pub fn record(&mut self, word: &str) {
        match self.counts.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.counts.insert(word.to_string(), 1);
            }
        }
    }

    /// Current count for `word` (0 if never seen).
    pub fn count(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Entries sorted by count descending. Equal counts are ordered by word
    /// ascending so the listing never depends on hash order.
    pub fn sorted_desc(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self
            .counts
            .iter()
            .map(|(word, count)| (word.as_str(), *count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}
