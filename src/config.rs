use std::env;
use std::path::PathBuf;

use anyhow::Result;

use crate::layout::WorkspaceLayout;

pub const DEFAULT_WORKING_DIR: &str = "data_analysis";
pub const DEFAULT_STOP_WORDS: &str = "data/stopwords.txt";
pub const DEFAULT_OTHER_WORDS: &str = "data/otherwords.txt";
pub const DEFAULT_FIELD_DELIMITER: &str = ",";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Command-line
/// flags override individual values after loading.
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder that holds input files and receives every artifact
    pub working_dir: PathBuf,
    pub stop_words_path: PathBuf,
    pub other_words_path: PathBuf,
    /// Delimiter of the source records
    pub field_delimiter: String,
}

impl Config {
    /// Load configuration from environment variables. Every value has a default.
    pub fn load() -> Result<Self> {
        let field_delimiter =
            env::var("TOPICMILL_DELIMITER").unwrap_or_else(|_| DEFAULT_FIELD_DELIMITER.to_string());
        if field_delimiter.is_empty() {
            anyhow::bail!("TOPICMILL_DELIMITER must not be empty");
        }

        Ok(Self {
            working_dir: env::var("TOPICMILL_WORKING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_WORKING_DIR)),
            stop_words_path: env::var("TOPICMILL_STOP_WORDS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STOP_WORDS)),
            other_words_path: env::var("TOPICMILL_OTHER_WORDS")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_OTHER_WORDS)),
            field_delimiter,
        })
    }

    /// Replace the working folder (the `-F` flag).
    pub fn with_working_dir(mut self, working_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = working_dir {
            self.working_dir = dir;
        }
        self
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(&self.working_dir)
    }
}
