// Category maps — document id to category code at three hierarchy levels.
//
// Loaded once from an auxiliary delimited file with four ordered fields:
// id, level-1 code, level-2 code, level-3 code. Blank codes are not recorded.
// Lookups for unknown ids return the MISSING_CATEGORY sentinel.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::layout::decoded_lines;

/// Number of category hierarchy levels.
pub const CATEGORY_LEVELS: usize = 3;

/// Category reported for ids absent from a level's map.
pub const MISSING_CATEGORY: &str = "null";

#[derive(Debug, Default, Clone)]
pub struct CategoryMaps {
    levels: [HashMap<String, String>; CATEGORY_LEVELS],
}

impl CategoryMaps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a file. A missing file is logged and yields empty maps.
    pub fn load(path: &Path, delimiter: &str, skip_first_line: bool) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "Category file not found, every id will be uncategorized");
            return Ok(Self::default());
        }
        let file = File::open(path)
            .with_context(|| format!("Failed to open category file {}", path.display()))?;
        let maps = Self::from_reader(BufReader::new(file), delimiter, skip_first_line)?;
        info!(
            path = %path.display(),
            level1 = maps.len(1),
            level2 = maps.len(2),
            level3 = maps.len(3),
            "Loaded category maps"
        );
        Ok(maps)
    }

    /// Parse category rows. Blank and `#` lines are ignored; rows with fewer
    /// than four fields are skipped with a warning.
    pub fn from_reader<R: BufRead>(reader: R, delimiter: &str, skip_first_line: bool) -> Result<Self> {
        let mut maps = Self::default();
        let skip = usize::from(skip_first_line);

        for (line_no, line) in decoded_lines(reader).enumerate().skip(skip) {
            let line = line.context("Failed to read category line")?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let values: Vec<&str> = line.split(delimiter).collect();
            if values.len() < CATEGORY_LEVELS + 1 {
                warn!(
                    line = line_no + 1,
                    fields = values.len(),
                    "Skipping category row with too few fields"
                );
                continue;
            }

            // Corpus ids are lower-cased, so lookups must be too
            let id = values[0].trim().to_lowercase();
            for level in 1..=CATEGORY_LEVELS {
                maps.insert(&id, level, values[level]);
            }
        }

        Ok(maps)
    }

    /// Record `code` for `id` at `level` (1-based). Blank codes are ignored.
    pub fn insert(&mut self, id: &str, level: usize, code: &str) {
        let code = code.trim();
        if code.is_empty() || !(1..=CATEGORY_LEVELS).contains(&level) {
            return;
        }
        self.levels[level - 1].insert(id.to_string(), code.to_string());
    }

    /// Category of `id` at `level` (1-based), if recorded.
    pub fn get(&self, level: usize, id: &str) -> Option<&str> {
        self.levels
            .get(level.wrapping_sub(1))?
            .get(id)
            .map(String::as_str)
    }

    /// Category of `id` at `level`, or the missing sentinel.
    pub fn category_or_missing(&self, level: usize, id: &str) -> &str {
        self.get(level, id).unwrap_or(MISSING_CATEGORY)
    }

    /// All three levels joined with `|`, sentinels included.
    pub fn combined_key(&self, id: &str) -> String {
        (1..=CATEGORY_LEVELS)
            .map(|level| self.category_or_missing(level, id))
            .collect::<Vec<_>>()
            .join("|")
    }

    /// Number of ids recorded at `level`.
    pub fn len(&self, level: usize) -> usize {
        self.levels
            .get(level.wrapping_sub(1))
            .map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.levels.iter().all(HashMap::is_empty)
    }
}
