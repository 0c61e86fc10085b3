// Training artifacts — the model, the instance set, the topic-keys report,
// and the document-topic composition report.
//
// The composition report is what the aggregator reads back:
//
//   #doc name topic proportion ...
//   0<TAB>doc-id<TAB>p0<TAB>p1 ...

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::lda::{LdaModel, TrainedModel, TrainingInstance};
use crate::layout::{open_artifact, OutputMode, WorkspaceLayout};

/// Words listed per topic in the topic-keys report.
pub const TOP_WORDS_PER_TOPIC: usize = 20;

pub const COMPOSITION_HEADER: &str = "#doc name topic proportion ...";

/// Write all four training artifacts under `layout`'s training folder.
pub fn write_training_artifacts(trained: &TrainedModel, layout: &WorkspaceLayout) -> Result<()> {
    let mut model_out = open_artifact(&layout.model(), OutputMode::Overwrite)?;
    serde_json::to_writer(&mut model_out, &trained.model)
        .with_context(|| format!("Failed to write model {}", layout.model().display()))?;
    model_out.flush()?;

    let mut instances_out = open_artifact(&layout.instances(), OutputMode::Overwrite)?;
    serde_json::to_writer(&mut instances_out, &trained.instances)
        .with_context(|| format!("Failed to write instances {}", layout.instances().display()))?;
    instances_out.flush()?;

    let mut keys_out = open_artifact(&layout.topic_keys(), OutputMode::Overwrite)?;
    write_topic_keys(&trained.model, TOP_WORDS_PER_TOPIC, &mut keys_out)?;
    keys_out.flush()?;

    let mut composition_out = open_artifact(&layout.topic_composition(), OutputMode::Overwrite)?;
    write_composition(&trained.instances, trained.model.alpha, &mut composition_out)?;
    composition_out.flush()?;

    info!(
        topics = trained.model.topic_count,
        documents = trained.instances.len(),
        dir = %layout.training_dir().display(),
        "Training artifacts written"
    );
    Ok(())
}

/// `topic<TAB>alpha<TAB>w1 w2 ...`, one line per topic.
pub fn write_topic_keys<W: Write>(model: &LdaModel, top_n: usize, out: &mut W) -> Result<()> {
    for topic in 0..model.topic_count {
        let words: Vec<&str> = model
            .top_words(topic, top_n)
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        writeln!(out, "{}\t{}\t{}", topic, model.alpha, words.join(" "))?;
    }
    Ok(())
}

/// Header, then `index<TAB>id<TAB>p0<TAB>p1 ...` per training document.
pub fn write_composition<W: Write>(
    instances: &[TrainingInstance],
    alpha: f64,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "{COMPOSITION_HEADER}")?;
    for (index, instance) in instances.iter().enumerate() {
        write!(out, "{}\t{}", index, instance.id)?;
        for p in instance.topic_distribution(alpha) {
            write!(out, "\t{p}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Load a persisted model.
pub fn load_model(path: &Path) -> Result<LdaModel> {
    let file = File::open(path).with_context(|| {
        format!(
            "No trained model at {}. Run `topicmill train` first.",
            path.display()
        )
    })?;
    let model: LdaModel = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse model {}", path.display()))?;
    Ok(model)
}
