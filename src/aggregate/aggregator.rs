// Topic assignment aggregator — reads a composition report, assigns every
// document to its most probable topic, and counts documents per topic per
// category at each hierarchy level.
//
// Every parsed record contributes exactly one increment to each of the four
// aggregates. Ids without a category still count, under MISSING_CATEGORY.
// Records that fail to parse are skipped and counted; the run continues.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::categories::{CategoryMaps, CATEGORY_LEVELS};
use super::composition::{parse_composition_line, TopicAssignmentRecord};
use super::counts::{CategoryCounts, TopicAggregate};
use crate::layout::{decoded_lines, open_artifact, OutputMode, WorkspaceLayout};

#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    /// Field delimiter of the composition report
    pub delimiter: String,
    /// Characters stripped from the front of the name field
    pub name_prefix_len: usize,
    /// When set, each document's content file (the stripped name, resolved
    /// under this folder) is appended to its topic's bundle
    pub content_root: Option<PathBuf>,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self {
            delimiter: "\t".to_string(),
            name_prefix_len: 0,
            content_root: None,
        }
    }
}

/// One `(id, topic)` row of the per-document output.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTopic {
    pub document_id: String,
    pub topic: i32,
}

/// Everything one aggregation run produces.
#[derive(Debug, Default)]
pub struct TopicAssignments {
    pub per_document: Vec<DocumentTopic>,
    /// Index 0 is level 1
    pub levels: [TopicAggregate; CATEGORY_LEVELS],
    /// Keyed by `l1|l2|l3`
    pub combined: TopicAggregate,
    /// Records that could not be parsed
    pub skipped: usize,
}

impl TopicAssignments {
    /// Add one document to every aggregate.
    pub fn record(&mut self, categories: &CategoryMaps, document_id: &str, topic: i32) {
        self.per_document.push(DocumentTopic {
            document_id: document_id.to_string(),
            topic,
        });
        for (i, aggregate) in self.levels.iter_mut().enumerate() {
            aggregate.increment(topic, categories.category_or_missing(i + 1, document_id));
        }
        self.combined.increment(topic, &categories.combined_key(document_id));
    }

    /// Aggregate for a 1-based category level.
    pub fn level(&self, level: usize) -> Option<&TopicAggregate> {
        self.levels.get(level.wrapping_sub(1))
    }

    /// Number of documents assigned to `topic`.
    pub fn documents_in_topic(&self, topic: i32) -> usize {
        self.per_document.iter().filter(|d| d.topic == topic).count()
    }

    /// Write the per-document listing, the three per-level folders, and the
    /// combined listing. All are overwritten; stale topic files in the level
    /// folders are removed first.
    pub fn write(&self, layout: &WorkspaceLayout) -> Result<()> {
        let mut out = open_artifact(&layout.topic_per_document(), OutputMode::Overwrite)?;
        for row in &self.per_document {
            writeln!(out, "{},{}", row.document_id, row.topic)?;
        }
        out.flush()?;

        for (i, aggregate) in self.levels.iter().enumerate() {
            clear_topic_files(&layout.category_dir(i + 1))?;
            for (topic, counts) in aggregate.iter() {
                let mut out = open_artifact(&layout.category_counts(i + 1, topic), OutputMode::Overwrite)?;
                write_category_counts(counts, &mut out)?;
                out.flush()?;
            }
        }

        let mut out = open_artifact(&layout.combined_counts(), OutputMode::Overwrite)?;
        write_combined_counts(&self.combined, &mut out)?;
        out.flush()?;

        info!(
            documents = self.per_document.len(),
            topics = self.combined.topic_numbers().len(),
            dir = %layout.training_dir().display(),
            "Aggregation outputs written"
        );
        Ok(())
    }
}

/// Remove `<topic>.txt` files left in `dir` by an earlier run, so the folder
/// only lists topics of the current one. A missing folder is fine.
fn clear_topic_files(dir: &Path) -> Result<()> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to list {}", dir.display()));
        }
    };
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        let is_topic_file = path.extension().is_some_and(|ext| ext == "txt")
            && path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.parse::<i32>().is_ok());
        if is_topic_file && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove stale {}", path.display()))?;
            debug!(path = %path.display(), "Removed stale category counts");
        }
    }
    Ok(())
}

/// `category;count` lines in first-seen order.
pub fn write_category_counts<W: Write>(counts: &CategoryCounts, out: &mut W) -> Result<()> {
    for (category, count) in counts.iter() {
        writeln!(out, "{category};{count}")?;
    }
    Ok(())
}

/// Flat `topic;category;count` lines.
pub fn write_combined_counts<W: Write>(aggregate: &TopicAggregate, out: &mut W) -> Result<()> {
    for (topic, counts) in aggregate.iter() {
        for (category, count) in counts.iter() {
            writeln!(out, "{topic};{category};{count}")?;
        }
    }
    Ok(())
}

pub struct Aggregator<'a> {
    categories: &'a CategoryMaps,
    options: AggregatorOptions,
}

impl<'a> Aggregator<'a> {
    pub fn new(categories: &'a CategoryMaps, options: AggregatorOptions) -> Self {
        Self {
            categories,
            options,
        }
    }

    /// Aggregate a composition report on disk. A missing report is logged
    /// and returns `Ok(None)`. Content bundles (if enabled) go under `layout`.
    pub fn aggregate(
        &self,
        composition_path: &Path,
        layout: &WorkspaceLayout,
    ) -> Result<Option<TopicAssignments>> {
        if !composition_path.exists() {
            warn!(path = %composition_path.display(), "Topic composition not found, skipping aggregation");
            return Ok(None);
        }
        let file = File::open(composition_path).with_context(|| {
            format!("Failed to open topic composition {}", composition_path.display())
        })?;
        self.run(BufReader::new(file), Some(layout)).map(Some)
    }

    /// Aggregate composition lines from any reader, without content bundling.
    pub fn aggregate_reader<R: BufRead>(&self, reader: R) -> Result<TopicAssignments> {
        self.run(reader, None)
    }

    fn run<R: BufRead>(&self, reader: R, layout: Option<&WorkspaceLayout>) -> Result<TopicAssignments> {
        let mut assignments = TopicAssignments::default();

        for (line_no, line) in decoded_lines(reader).enumerate() {
            let line = line.context("Failed to read topic composition line")?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let record = match parse_composition_line(
                &line,
                &self.options.delimiter,
                self.options.name_prefix_len,
            ) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "Skipping composition record");
                    assignments.skipped += 1;
                    continue;
                }
            };

            let topic = record.assigned_topic();
            debug!(id = %record.document_id, topic, "Assigned topic");

            if let (Some(root), Some(layout)) = (&self.options.content_root, layout) {
                bundle_content(root, layout, &record, topic)?;
            }

            assignments.record(self.categories, &record.document_id, topic);
        }

        Ok(assignments)
    }
}

/// Append a document's content (non-empty lines, space separated) to its
/// topic bundle. A missing content file only skips the bundle.
fn bundle_content(
    content_root: &Path,
    layout: &WorkspaceLayout,
    record: &TopicAssignmentRecord,
    topic: i32,
) -> Result<()> {
    let content_path = content_root.join(&record.source_path);
    if !content_path.is_file() {
        warn!(path = %content_path.display(), id = %record.document_id, "Content file not found, not bundled");
        return Ok(());
    }

    let file = File::open(&content_path)
        .with_context(|| format!("Failed to open content {}", content_path.display()))?;
    let mut content = String::new();
    for line in decoded_lines(BufReader::new(file)) {
        let line = line.with_context(|| format!("Failed to read {}", content_path.display()))?;
        if !line.is_empty() {
            content.push_str(&line);
            content.push(' ');
        }
    }

    let mut out = open_artifact(&layout.bundle(topic), OutputMode::Append)?;
    out.write_all(content.as_bytes())?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::categories::MISSING_CATEGORY;

    fn categories() -> CategoryMaps {
        CategoryMaps::from_reader("1,A,A1,A11\n2,B,B1,\n".as_bytes(), ",", false).unwrap()
    }

    #[test]
    fn test_each_record_increments_every_aggregate_once() {
        let maps = categories();
        let aggregator = Aggregator::new(&maps, AggregatorOptions::default());
        let input = "#doc name topic proportion ...\n0\t1\t0.1\t0.9\n1\t2\t0.8\t0.2\n2\t3\t0.3\t0.7\n";
        let result = aggregator.aggregate_reader(input.as_bytes()).unwrap();

        assert_eq!(result.per_document.len(), 3);
        for level in 1..=CATEGORY_LEVELS {
            let aggregate = result.level(level).unwrap();
            assert_eq!(aggregate.topic_total(0) + aggregate.topic_total(1), 3);
        }
        assert_eq!(result.level(1).unwrap().topic(1).unwrap().get("A"), 1);
        assert_eq!(result.level(1).unwrap().topic(1).unwrap().get(MISSING_CATEGORY), 1);
        assert_eq!(result.level(3).unwrap().topic(0).unwrap().get(MISSING_CATEGORY), 1);
        assert_eq!(result.combined.topic(1).unwrap().get("A|A1|A11"), 1);
        assert_eq!(result.combined.topic(1).unwrap().get("null|null|null"), 1);
        assert_eq!(result.combined.topic(0).unwrap().get("B|B1|null"), 1);
    }

    #[test]
    fn test_bad_records_are_skipped() {
        let maps = categories();
        let aggregator = Aggregator::new(&maps, AggregatorOptions::default());
        let input = "0\t1\t0.5\tnope\n1\t2\t0.4\t0.6\n";
        let result = aggregator.aggregate_reader(input.as_bytes()).unwrap();
        assert_eq!(result.skipped, 1);
        assert_eq!(
            result.per_document,
            vec![DocumentTopic {
                document_id: "2".to_string(),
                topic: 1
            }]
        );
    }

    #[test]
    fn test_unassigned_records_are_kept() {
        let maps = categories();
        let aggregator = Aggregator::new(&maps, AggregatorOptions::default());
        let result = aggregator.aggregate_reader("0\t1\n".as_bytes()).unwrap();
        assert_eq!(result.documents_in_topic(-1), 1);
        assert_eq!(result.level(1).unwrap().topic_total(-1), 1);
    }

    #[test]
    fn test_emission_formats() {
        let mut aggregate = TopicAggregate::default();
        aggregate.increment(1, "B");
        aggregate.increment(0, "A|x|null");
        aggregate.increment(1, "B");

        let mut out = Vec::new();
        write_combined_counts(&aggregate, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0;A|x|null;1\n1;B;2\n");

        let mut out = Vec::new();
        write_category_counts(aggregate.topic(1).unwrap(), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "B;2\n");
    }
}
