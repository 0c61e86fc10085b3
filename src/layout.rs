// Working-folder layout — where every generated artifact lives.
//
// Paths are fixed relative to the working folder so the corpus builder, the
// topic engine, and the aggregator can find each other's output without
// passing file names around.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const TRAINING_DIR: &str = "training";
pub const PRE_ANALYSIS_DIR: &str = "pre_analysis";

pub const TRAINING_CORPUS_FILE: &str = "data_training.txt";
pub const BAG_OF_WORDS_FILE: &str = "allwords.txt";
pub const WORDS_PER_DOCUMENT_FILE: &str = "allwords_ids.csv";
pub const VOCABULARY_FILE: &str = "allwordswithcount.csv";

pub const MODEL_FILE: &str = "model.json";
pub const INSTANCES_FILE: &str = "instances.json";
pub const TOPIC_KEYS_FILE: &str = "topic_keys.txt";
pub const TOPIC_COMPOSITION_FILE: &str = "topic_composition.txt";

pub const TOPIC_PER_DOCUMENT_FILE: &str = "topicperid.csv";
pub const COMBINED_COUNTS_FILE: &str = "topicsadvicecode.csv";
pub const CATEGORY_DIR_PREFIX: &str = "topicsadvicecode";
pub const BUNDLE_DIR: &str = "topics";

/// How an artifact file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Truncate and rewrite (generated artifacts)
    #[default]
    Overwrite,
    /// Accumulate across runs (content bundles)
    Append,
}

/// Open `path` for writing, creating parent directories as needed.
pub fn open_artifact(path: &Path, mode: OutputMode) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let file = match mode {
        OutputMode::Overwrite => File::create(path),
        OutputMode::Append => OpenOptions::new().create(true).append(true).open(path),
    }
    .with_context(|| format!("Failed to open {} for writing", path.display()))?;

    Ok(BufWriter::new(file))
}

/// Lines of `reader` without their `\n` / `\r\n` terminators.
///
/// Lines that are not valid UTF-8 are decoded as Latin-1, so one stray
/// byte (a `£` saved as 0xA3, say) never aborts a pass.
pub fn decoded_lines<R: BufRead>(reader: R) -> DecodedLines<R> {
    DecodedLines {
        reader,
        buf: Vec::new(),
    }
}

pub struct DecodedLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for DecodedLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                    if self.buf.ends_with(b"\r") {
                        self.buf.pop();
                    }
                }
                let line = match std::str::from_utf8(&self.buf) {
                    Ok(text) => text.to_string(),
                    Err(_) => self.buf.iter().map(|&b| char::from(b)).collect(),
                };
                Some(Ok(line))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Artifact paths under one working folder.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn training_dir(&self) -> PathBuf {
        self.root.join(TRAINING_DIR)
    }

    pub fn pre_analysis_dir(&self) -> PathBuf {
        self.root.join(PRE_ANALYSIS_DIR)
    }

    /// Input file named relative to the working folder.
    pub fn source(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    pub fn training_corpus(&self) -> PathBuf {
        self.training_dir().join(TRAINING_CORPUS_FILE)
    }

    pub fn bag_of_words(&self) -> PathBuf {
        self.pre_analysis_dir().join(BAG_OF_WORDS_FILE)
    }

    pub fn words_per_document(&self) -> PathBuf {
        self.pre_analysis_dir().join(WORDS_PER_DOCUMENT_FILE)
    }

    pub fn vocabulary(&self) -> PathBuf {
        self.pre_analysis_dir().join(VOCABULARY_FILE)
    }

    pub fn model(&self) -> PathBuf {
        self.training_dir().join(MODEL_FILE)
    }

    pub fn instances(&self) -> PathBuf {
        self.training_dir().join(INSTANCES_FILE)
    }

    pub fn topic_keys(&self) -> PathBuf {
        self.training_dir().join(TOPIC_KEYS_FILE)
    }

    pub fn topic_composition(&self) -> PathBuf {
        self.training_dir().join(TOPIC_COMPOSITION_FILE)
    }

    pub fn topic_per_document(&self) -> PathBuf {
        self.training_dir().join(TOPIC_PER_DOCUMENT_FILE)
    }

    /// Folder holding one hierarchy level's per-topic counts (1-based).
    pub fn category_dir(&self, level: usize) -> PathBuf {
        self.training_dir().join(format!("{CATEGORY_DIR_PREFIX}{level}"))
    }

    pub fn category_counts(&self, level: usize, topic: i32) -> PathBuf {
        self.category_dir(level).join(format!("{topic}.txt"))
    }

    pub fn combined_counts(&self) -> PathBuf {
        self.training_dir().join(COMBINED_COUNTS_FILE)
    }

    pub fn bundle(&self, topic: i32) -> PathBuf {
        self.training_dir()
            .join(BUNDLE_DIR)
            .join(format!("{topic}.txt"))
    }

    /// Every fixed artifact with a display label, in pipeline order.
    pub fn artifacts(&self) -> Vec<(&'static str, PathBuf)> {
        vec![
            ("Bag of words", self.bag_of_words()),
            ("Words per document", self.words_per_document()),
            ("Vocabulary", self.vocabulary()),
            ("Training corpus", self.training_corpus()),
            ("Model", self.model()),
            ("Instances", self.instances()),
            ("Topic keys", self.topic_keys()),
            ("Topic composition", self.topic_composition()),
            ("Topic per document", self.topic_per_document()),
            ("Combined category counts", self.combined_counts()),
        ]
    }
}
