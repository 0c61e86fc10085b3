// Latent Dirichlet Allocation with collapsed Gibbs sampling.
//
// This is the bundled TopicEngine. Training runs a fixed number of sweeps
// from a fixed seed so that the same corpus always yields the same model.
// Inference samples a new document's topic assignments against the frozen
// topic-word counts and averages the post-burn-in samples.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::traits::TopicEngine;
use crate::layout::decoded_lines;

/// Gibbs sweeps over the whole corpus during training.
pub const DEFAULT_ITERATIONS: usize = 2000;
/// Fixed seed so runs are reproducible.
pub const DEFAULT_SEED: u64 = 1;

/// Sampling parameters for scoring a new document.
#[derive(Debug, Clone)]
pub struct InferenceParams {
    /// Total sweeps over the document
    pub samples: usize,
    /// Sweeps discarded before averaging
    pub burn_in: usize,
    /// Keep every n-th sweep after burn-in
    pub thinning: usize,
}

impl Default for InferenceParams {
    fn default() -> Self {
        Self {
            samples: 30,
            burn_in: 5,
            thinning: 1,
        }
    }
}

/// Hyperparameters for training.
#[derive(Debug, Clone)]
pub struct LdaConfig {
    /// Document-topic prior, per topic
    pub alpha: f64,
    /// Topic-word prior
    pub beta: f64,
    pub iterations: usize,
    pub seed: u64,
    pub inference: InferenceParams,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.01,
            iterations: DEFAULT_ITERATIONS,
            seed: DEFAULT_SEED,
            inference: InferenceParams::default(),
        }
    }
}

/// The persisted model: vocabulary plus frozen topic-word counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdaModel {
    pub topic_count: usize,
    pub alpha: f64,
    pub beta: f64,
    pub iterations: usize,
    pub seed: u64,
    pub trained_at: DateTime<Utc>,
    pub vocabulary: Vec<String>,
    /// `topic_word_counts[topic][word]`
    pub topic_word_counts: Vec<Vec<u32>>,
    pub topic_totals: Vec<u64>,
}

/// One training document after tokenization, with its final topic counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingInstance {
    pub id: String,
    pub label: String,
    /// Indices into the model vocabulary
    pub tokens: Vec<usize>,
    pub topic_counts: Vec<u32>,
}

impl TrainingInstance {
    /// Smoothed topic proportions: `(n_dk + alpha) / (n_d + K * alpha)`.
    pub fn topic_distribution(&self, alpha: f64) -> Vec<f64> {
        let k = self.topic_counts.len();
        let denominator = self.tokens.len() as f64 + k as f64 * alpha;
        self.topic_counts
            .iter()
            .map(|&count| (count as f64 + alpha) / denominator)
            .collect()
    }
}

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: LdaModel,
    pub instances: Vec<TrainingInstance>,
}

/// One `id,label,words` corpus line.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusDocument {
    pub id: String,
    pub label: String,
    pub text: String,
}

/// Split a corpus line into id, label, and text. Lines without two commas
/// are not documents.
pub fn parse_training_line(line: &str) -> Option<CorpusDocument> {
    let mut parts = line.splitn(3, ',');
    let id = parts.next()?.trim();
    let label = parts.next()?.trim();
    let text = parts.next()?.trim();
    if id.is_empty() {
        return None;
    }
    Some(CorpusDocument {
        id: id.to_string(),
        label: label.to_string(),
        text: text.to_string(),
    })
}

/// Read every document of a training corpus file.
pub fn read_training_corpus(path: &Path) -> Result<Vec<CorpusDocument>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open training corpus {}", path.display()))?;
    let mut documents = Vec::new();
    for line in decoded_lines(BufReader::new(file)) {
        let line = line.context("Failed to read training corpus line")?;
        if let Some(doc) = parse_training_line(&line) {
            documents.push(doc);
        }
    }
    Ok(documents)
}

/// Model tokens: at least three characters, starting and ending with a
/// letter, letters or punctuation in between.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|token| {
        let chars: Vec<char> = token.chars().collect();
        chars.len() >= 3
            && chars[0].is_alphabetic()
            && chars[chars.len() - 1].is_alphabetic()
            && chars
                .iter()
                .all(|c| c.is_alphabetic() || c.is_ascii_punctuation())
    })
}

impl LdaModel {
    pub fn vocabulary_index(&self) -> HashMap<&str, usize> {
        self.vocabulary
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), i))
            .collect()
    }

    /// The `n` highest-count words of `topic`, ties by vocabulary order.
    pub fn top_words(&self, topic: usize, n: usize) -> Vec<(&str, u32)> {
        let Some(counts) = self.topic_word_counts.get(topic) else {
            return Vec::new();
        };
        let mut words: Vec<(usize, u32)> = counts
            .iter()
            .enumerate()
            .filter(|(_, &c)| c > 0)
            .map(|(i, &c)| (i, c))
            .collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words
            .into_iter()
            .take(n)
            .map(|(i, c)| (self.vocabulary[i].as_str(), c))
            .collect()
    }

    /// Map text to vocabulary indices, dropping unknown words.
    pub fn token_ids(&self, text: &str) -> Vec<usize> {
        let index = self.vocabulary_index();
        tokenize(text)
            .filter_map(|token| index.get(token).copied())
            .collect()
    }

    /// Sample a topic distribution for `tokens` against the frozen counts.
    pub fn infer_tokens(&self, tokens: &[usize], params: &InferenceParams, rng: &mut StdRng) -> Vec<f64> {
        let k = self.topic_count;
        if k == 0 {
            return Vec::new();
        }
        if tokens.is_empty() {
            return vec![1.0 / k as f64; k];
        }

        let v_beta = self.vocabulary.len() as f64 * self.beta;
        let mut assignments: Vec<usize> = tokens.iter().map(|_| rng.random_range(0..k)).collect();
        let mut doc_counts = vec![0u32; k];
        for &topic in &assignments {
            doc_counts[topic] += 1;
        }

        let thinning = params.thinning.max(1);
        let mut sums = vec![0.0f64; k];
        let mut kept = 0usize;
        let mut weights = vec![0.0f64; k];

        for sweep in 0..params.samples {
            for (pos, &word) in tokens.iter().enumerate() {
                let old = assignments[pos];
                doc_counts[old] -= 1;

                for (topic, weight) in weights.iter_mut().enumerate() {
                    *weight = (doc_counts[topic] as f64 + self.alpha)
                        * (self.topic_word_counts[topic][word] as f64 + self.beta)
                        / (self.topic_totals[topic] as f64 + v_beta);
                }
                let new = sample_index(&weights, rng);

                doc_counts[new] += 1;
                assignments[pos] = new;
            }

            if sweep >= params.burn_in && (sweep - params.burn_in) % thinning == 0 {
                for (sum, &count) in sums.iter_mut().zip(&doc_counts) {
                    *sum += count as f64;
                }
                kept += 1;
            }
        }

        if kept == 0 {
            for (sum, &count) in sums.iter_mut().zip(&doc_counts) {
                *sum = count as f64;
            }
            kept = 1;
        }

        let smoothed: Vec<f64> = sums
            .iter()
            .map(|&s| s + self.alpha * kept as f64)
            .collect();
        let total: f64 = smoothed.iter().sum();
        smoothed.into_iter().map(|s| s / total).collect()
    }
}

/// Draw an index proportional to `weights`.
fn sample_index(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    let threshold = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, &w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= threshold {
            return i;
        }
    }
    weights.len() - 1
}

/// Collapsed Gibbs LDA engine.
#[derive(Debug, Clone, Default)]
pub struct GibbsLda {
    pub config: LdaConfig,
}

impl GibbsLda {
    pub fn new(config: LdaConfig) -> Self {
        Self { config }
    }

    /// Train on in-memory documents.
    pub fn fit(&self, documents: &[CorpusDocument], topic_count: usize) -> Result<TrainedModel> {
        if topic_count == 0 {
            anyhow::bail!("Number of topics must be greater than 0");
        }

        // Vocabulary in first-seen order
        let mut vocabulary: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut instances: Vec<TrainingInstance> = Vec::with_capacity(documents.len());
        for doc in documents {
            let tokens = tokenize(&doc.text)
                .map(|token| {
                    *index.entry(token.to_string()).or_insert_with(|| {
                        vocabulary.push(token.to_string());
                        vocabulary.len() - 1
                    })
                })
                .collect();
            instances.push(TrainingInstance {
                id: doc.id.clone(),
                label: doc.label.clone(),
                tokens,
                topic_counts: vec![0; topic_count],
            });
        }

        if vocabulary.is_empty() {
            anyhow::bail!(
                "Training corpus has no usable tokens across {} documents",
                documents.len()
            );
        }

        let k = topic_count;
        let alpha = self.config.alpha;
        let beta = self.config.beta;
        let v_beta = vocabulary.len() as f64 * beta;
        let mut rng = StdRng::seed_from_u64(self.config.seed);

        let mut topic_word_counts = vec![vec![0u32; vocabulary.len()]; k];
        let mut topic_totals = vec![0u64; k];
        let mut assignments: Vec<Vec<usize>> = Vec::with_capacity(instances.len());

        for instance in &mut instances {
            let mut doc_assignments = Vec::with_capacity(instance.tokens.len());
            for &word in &instance.tokens {
                let topic = rng.random_range(0..k);
                doc_assignments.push(topic);
                topic_word_counts[topic][word] += 1;
                topic_totals[topic] += 1;
                instance.topic_counts[topic] += 1;
            }
            assignments.push(doc_assignments);
        }

        info!(
            documents = instances.len(),
            vocabulary = vocabulary.len(),
            topics = k,
            iterations = self.config.iterations,
            "Starting Gibbs sampling"
        );

        let pb = ProgressBar::new(self.config.iterations as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Sampling [{bar:30}] {pos}/{len} ({eta})")
                .context("Invalid progress bar template")?,
        );

        let mut weights = vec![0.0f64; k];
        for _ in 0..self.config.iterations {
            for (instance, doc_assignments) in instances.iter_mut().zip(assignments.iter_mut()) {
                for (pos, &word) in instance.tokens.iter().enumerate() {
                    let old = doc_assignments[pos];
                    topic_word_counts[old][word] -= 1;
                    topic_totals[old] -= 1;
                    instance.topic_counts[old] -= 1;

                    for (topic, weight) in weights.iter_mut().enumerate() {
                        *weight = (instance.topic_counts[topic] as f64 + alpha)
                            * (topic_word_counts[topic][word] as f64 + beta)
                            / (topic_totals[topic] as f64 + v_beta);
                    }
                    let new = sample_index(&weights, &mut rng);

                    topic_word_counts[new][word] += 1;
                    topic_totals[new] += 1;
                    instance.topic_counts[new] += 1;
                    doc_assignments[pos] = new;
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        Ok(TrainedModel {
            model: LdaModel {
                topic_count: k,
                alpha,
                beta,
                iterations: self.config.iterations,
                seed: self.config.seed,
                trained_at: Utc::now(),
                vocabulary,
                topic_word_counts,
                topic_totals,
            },
            instances,
        })
    }

    /// Score a document against a bare model (no training instances needed).
    pub fn infer_with(&self, model: &LdaModel, document: &str) -> Vec<f64> {
        let tokens = model.token_ids(document);
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        model.infer_tokens(&tokens, &self.config.inference, &mut rng)
    }
}

impl TopicEngine for GibbsLda {
    type Model = TrainedModel;

    fn train(&self, corpus_path: &Path, topic_count: usize) -> Result<TrainedModel> {
        let documents = read_training_corpus(corpus_path)?;
        self.fit(&documents, topic_count)
    }

    fn infer(&self, model: &TrainedModel, document: &str) -> Result<Vec<f64>> {
        Ok(self.infer_with(&model.model, document))
    }
}
