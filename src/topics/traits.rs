// Topic engine trait — swap-ready abstraction over the statistical model.
//
// The rest of the pipeline only prepares the corpus and reads back topic
// distributions, so any LDA-capable backend can sit behind this trait.

use std::path::Path;

use anyhow::Result;

/// Trains a topic model from a prepared corpus and scores new documents.
pub trait TopicEngine {
    /// Handle to a trained model.
    type Model;

    /// Train on a corpus file of `id,label,words` lines.
    fn train(&self, corpus_path: &Path, topic_count: usize) -> Result<Self::Model>;

    /// Topic probability vector for one normalized document. The vector has
    /// one entry per topic and sums to 1.0.
    fn infer(&self, model: &Self::Model, document: &str) -> Result<Vec<f64>>;
}
