// Composition tests — verifying that the pipeline stages chain together.
//
// These tests exercise the data flow between modules:
//   Normalizer -> Corpus Builder -> Topic Engine -> Aggregator
// against a temporary working folder.

use std::fs;

use topicmill::aggregate::aggregator::{Aggregator, AggregatorOptions};
use topicmill::aggregate::categories::CategoryMaps;
use topicmill::corpus::builder::{CorpusBuilder, CorpusOptions};
use topicmill::layout::WorkspaceLayout;
use topicmill::text::frequency::WordFrequencyTable;
use topicmill::text::normalizer::Normalizer;
use topicmill::topics::lda::{GibbsLda, LdaConfig};
use topicmill::topics::report::{load_model, write_training_artifacts};
use topicmill::topics::traits::TopicEngine;

const SOURCE: &str = "\
id,l1,l2,l3,text,e1,e2,e3,e4
101,FIN,FIN1,FIN11,Mortgage payments and loan interest rates,bank,,,
102,FIN,FIN2,,Savings account interest and bank loan,bank,loan,,
103,HOU,HOU1,,Landlord repairs and tenancy deposit,rent,,,
104,HOU,,,Tenancy rent arrears and landlord eviction,rent,,,
101,XXX,,,Duplicate row that must vanish,,,,
105,FIN,FIN1,,Credit card debt and loan repayments,,,,
";

fn engine() -> GibbsLda {
    GibbsLda::new(LdaConfig {
        iterations: 100,
        ..LdaConfig::default()
    })
}

fn working_folder() -> (tempfile::TempDir, WorkspaceLayout) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("records.csv"), SOURCE).unwrap();
    let layout = WorkspaceLayout::new(dir.path());
    (dir, layout)
}

fn normalizer() -> Normalizer {
    let stop_words: Vec<String> = ["and", "the", "must"].iter().map(|w| w.to_string()).collect();
    Normalizer::new(&stop_words, &[]).unwrap()
}

// ============================================================
// Chain: Corpus Builder -> Topic Engine -> Aggregator
// ============================================================

#[test]
fn corpus_training_and_aggregation_chain() {
    let (_dir, layout) = working_folder();
    let normalizer = normalizer();

    let summary = CorpusBuilder::new(&normalizer, CorpusOptions::default())
        .build(&layout.source("records.csv"), &layout)
        .unwrap()
        .unwrap();
    assert_eq!(summary.documents_written, 5);
    assert_eq!(summary.duplicates_skipped, 1);

    let training = fs::read_to_string(layout.training_corpus()).unwrap();
    assert!(training.starts_with("101,X,mortgage payments loan interest rates\n"));
    assert!(!training.contains("duplicate"));

    let trained = engine().train(&layout.training_corpus(), 2).unwrap();
    assert_eq!(trained.instances.len(), 5);
    write_training_artifacts(&trained, &layout).unwrap();

    let categories = CategoryMaps::load(&layout.source("records.csv"), ",", false).unwrap();
    let aggregator = Aggregator::new(&categories, AggregatorOptions::default());
    let assignments = aggregator
        .aggregate(&layout.topic_composition(), &layout)
        .unwrap()
        .unwrap();
    assignments.write(&layout).unwrap();

    // Every training document is assigned to a real topic exactly once
    assert_eq!(assignments.per_document.len(), 5);
    assert!(assignments.per_document.iter().all(|d| (0..2).contains(&d.topic)));
    let level1_total: u64 = (0..2)
        .map(|t| assignments.level(1).unwrap().topic_total(t))
        .sum();
    assert_eq!(level1_total, 5);

    let per_id = fs::read_to_string(layout.topic_per_document()).unwrap();
    let ids: Vec<&str> = per_id.lines().map(|l| l.split(',').next().unwrap()).collect();
    assert_eq!(ids, vec!["101", "102", "103", "104", "105"]);
}

#[test]
fn trained_model_scores_new_documents() {
    let (_dir, layout) = working_folder();
    let normalizer = normalizer();
    CorpusBuilder::new(&normalizer, CorpusOptions::default())
        .build(&layout.source("records.csv"), &layout)
        .unwrap();

    let engine = engine();
    let trained = engine.train(&layout.training_corpus(), 3).unwrap();
    write_training_artifacts(&trained, &layout).unwrap();

    let model = load_model(&layout.model()).unwrap();
    let mut frequencies = WordFrequencyTable::new();
    let document = normalizer.normalize("the landlord wants rent", &mut frequencies);
    let distribution = engine.infer_with(&model, &document);

    assert_eq!(distribution.len(), 3);
    assert!((distribution.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn rebuilding_overwrites_generated_artifacts() {
    let (_dir, layout) = working_folder();
    let normalizer = normalizer();
    let builder = CorpusBuilder::new(&normalizer, CorpusOptions::default());

    builder.build(&layout.source("records.csv"), &layout).unwrap();
    let first = fs::read_to_string(layout.words_per_document()).unwrap();
    builder.build(&layout.source("records.csv"), &layout).unwrap();
    let second = fs::read_to_string(layout.words_per_document()).unwrap();

    assert_eq!(first, second);
    assert_eq!(second.lines().count(), 6);
}

#[test]
fn missing_source_skips_the_build() {
    let (_dir, layout) = working_folder();
    let normalizer = normalizer();
    let result = CorpusBuilder::new(&normalizer, CorpusOptions::default())
        .build(&layout.source("absent.csv"), &layout)
        .unwrap();
    assert!(result.is_none());
    assert!(!layout.training_corpus().exists());
}
