// Corpus builder — one streaming pass over a delimited source file that
// produces the training corpus and the three pre-analysis listings.
//
// Per-run state (the id set and the vocabulary table) lives in `CorpusRun`,
// created fresh by every build. Output order follows the filtered source
// order.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::record::{parse_record, FieldSpec, RecordRejection};
use crate::layout::{decoded_lines, open_artifact, OutputMode, WorkspaceLayout};
use crate::text::frequency::WordFrequencyTable;
use crate::text::normalizer::Normalizer;

/// Label written into every training line.
pub const DEFAULT_DOCUMENT_LABEL: &str = "X";

pub const WORDS_PER_DOCUMENT_HEADER: &str = "id,primary_field_words,extra_fields_words";
pub const VOCABULARY_HEADER: &str = "word,count";

/// How the source is read and what gets emitted.
#[derive(Debug, Clone)]
pub struct CorpusOptions {
    pub fields: FieldSpec,
    /// Append the extra-field words to each training line
    pub include_extra_fields: bool,
    /// Drop second and later occurrences of an id
    pub ignore_duplicates: bool,
    /// Treat the first line as a header
    pub skip_first_line: bool,
    /// How the four artifacts are opened
    pub output_mode: OutputMode,
}

impl Default for CorpusOptions {
    fn default() -> Self {
        Self {
            fields: FieldSpec::default(),
            include_extra_fields: false,
            ignore_duplicates: true,
            skip_first_line: true,
            output_mode: OutputMode::Overwrite,
        }
    }
}

/// The four output streams of a build.
pub struct CorpusWriters<W: Write> {
    pub training: W,
    pub bag_of_words: W,
    pub words_per_document: W,
    pub vocabulary: W,
}

/// Mutable state owned by a single build.
#[derive(Debug, Default)]
pub struct CorpusRun {
    pub seen_ids: HashSet<String>,
    pub frequencies: WordFrequencyTable,
}

/// What a build read, kept, and skipped.
#[derive(Debug, Default)]
pub struct CorpusSummary {
    pub lines_read: usize,
    pub documents_written: usize,
    pub duplicates_skipped: usize,
    pub empty_skipped: usize,
    pub malformed_skipped: usize,
    /// Retained ids in output order
    pub document_ids: Vec<String>,
    pub frequencies: WordFrequencyTable,
}

/// Normalized words for one retained document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWords {
    pub id: String,
    pub primary_words: String,
    pub extra_words: String,
}

impl DocumentWords {
    /// `id,X,words`, the line the topic engine trains on.
    pub fn training_line(&self, include_extra_fields: bool) -> String {
        let words = if include_extra_fields {
            join_words(&self.primary_words, &self.extra_words)
        } else {
            self.primary_words.clone()
        };
        format!("{},{},{}", self.id, DEFAULT_DOCUMENT_LABEL, words)
    }

    pub fn bag_of_words_line(&self) -> String {
        join_words(&self.primary_words, &self.extra_words)
    }

    pub fn words_per_document_line(&self) -> String {
        format!("{},{},{}", self.id, self.primary_words, self.extra_words)
    }
}

fn join_words(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (_, true) => a.to_string(),
        (true, false) => b.to_string(),
        (false, false) => format!("{a} {b}"),
    }
}

/// Builds corpora with a shared normalizer.
pub struct CorpusBuilder<'a> {
    normalizer: &'a Normalizer,
    options: CorpusOptions,
}

impl<'a> CorpusBuilder<'a> {
    pub fn new(normalizer: &'a Normalizer, options: CorpusOptions) -> Self {
        Self {
            normalizer,
            options,
        }
    }

    /// Build every artifact of `layout` from `source`.
    ///
    /// A missing source is reported and skipped: returns `Ok(None)`.
    /// I/O failures abort the build; files already written are left as-is.
    pub fn build(&self, source: &Path, layout: &WorkspaceLayout) -> Result<Option<CorpusSummary>> {
        if !source.exists() {
            warn!(path = %source.display(), "Source file not found, skipping corpus build");
            return Ok(None);
        }

        let input = File::open(source)
            .with_context(|| format!("Failed to open source {}", source.display()))?;

        let mode = self.options.output_mode;
        let mut writers = CorpusWriters {
            training: open_artifact(&layout.training_corpus(), mode)?,
            bag_of_words: open_artifact(&layout.bag_of_words(), mode)?,
            words_per_document: open_artifact(&layout.words_per_document(), mode)?,
            vocabulary: open_artifact(&layout.vocabulary(), mode)?,
        };

        let summary = self.build_from_reader(BufReader::new(input), &mut writers)?;

        writers.training.flush()?;
        writers.bag_of_words.flush()?;
        writers.words_per_document.flush()?;
        writers.vocabulary.flush()?;

        info!(
            source = %source.display(),
            documents = summary.documents_written,
            duplicates = summary.duplicates_skipped,
            vocabulary = summary.frequencies.len(),
            "Corpus built"
        );

        Ok(Some(summary))
    }

    /// Stream `reader` into `writers`. Headers are written first, the
    /// vocabulary listing last.
    pub fn build_from_reader<R: BufRead, W: Write>(
        &self,
        reader: R,
        writers: &mut CorpusWriters<W>,
    ) -> Result<CorpusSummary> {
        let mut run = CorpusRun::default();
        let mut summary = CorpusSummary::default();

        writeln!(writers.words_per_document, "{WORDS_PER_DOCUMENT_HEADER}")?;
        writeln!(writers.vocabulary, "{VOCABULARY_HEADER}")?;

        let skip = usize::from(self.options.skip_first_line);
        for (line_no, line) in decoded_lines(reader).enumerate().skip(skip) {
            let line = line.context("Failed to read source line")?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            summary.lines_read += 1;

            let Some(document) = self.process_line(&mut run, &mut summary, line_no + 1, &line)
            else {
                continue;
            };

            writeln!(
                writers.training,
                "{}",
                document.training_line(self.options.include_extra_fields)
            )?;
            writeln!(writers.bag_of_words, "{}", document.bag_of_words_line())?;
            writeln!(writers.words_per_document, "{}", document.words_per_document_line())?;

            summary.documents_written += 1;
            summary.document_ids.push(document.id);
        }

        for (word, count) in run.frequencies.sorted_desc() {
            writeln!(writers.vocabulary, "{word},{count}")?;
        }

        summary.frequencies = run.frequencies;
        Ok(summary)
    }

    /// Parse, filter, and normalize one line. `None` means the line was skipped.
    fn process_line(
        &self,
        run: &mut CorpusRun,
        summary: &mut CorpusSummary,
        line_no: usize,
        line: &str,
    ) -> Option<DocumentWords> {
        let line = line.to_lowercase();

        let record = match parse_record(&line, &self.options.fields) {
            Ok(record) => record,
            Err(RecordRejection::EmptyPrimary) => {
                summary.empty_skipped += 1;
                return None;
            }
            Err(reason) => {
                warn!(line = line_no, %reason, "Skipping malformed record");
                summary.malformed_skipped += 1;
                return None;
            }
        };

        if self.options.ignore_duplicates && !run.seen_ids.insert(record.id.clone()) {
            debug!(line = line_no, id = %record.id, "Skipping duplicate id");
            summary.duplicates_skipped += 1;
            return None;
        }

        let primary_words = self
            .normalizer
            .normalize(&record.primary_text, &mut run.frequencies);
        let extra_words = self
            .normalizer
            .normalize(&record.extra_text, &mut run.frequencies);

        Some(DocumentWords {
            id: record.id,
            primary_words,
            extra_words,
        })
    }
}
