// Unit tests for the corpus builder.
//
// Builds corpora into in-memory writers and checks the four listings:
// de-duplication across every artifact, stable ordering, skipped records,
// and the vocabulary listing's order.

use topicmill::corpus::builder::{CorpusBuilder, CorpusOptions, CorpusSummary, CorpusWriters};
use topicmill::corpus::record::FieldSpec;
use topicmill::text::normalizer::Normalizer;
use topicmill::text::wordlist::parse_word_list;

struct Built {
    summary: CorpusSummary,
    training: String,
    bag_of_words: String,
    words_per_document: String,
    vocabulary: String,
}

fn build(source: &str, normalizer: &Normalizer, options: CorpusOptions) -> Built {
    let mut writers = CorpusWriters {
        training: Vec::new(),
        bag_of_words: Vec::new(),
        words_per_document: Vec::new(),
        vocabulary: Vec::new(),
    };
    let summary = CorpusBuilder::new(normalizer, options)
        .build_from_reader(source.as_bytes(), &mut writers)
        .unwrap();
    Built {
        summary,
        training: String::from_utf8(writers.training).unwrap(),
        bag_of_words: String::from_utf8(writers.bag_of_words).unwrap(),
        words_per_document: String::from_utf8(writers.words_per_document).unwrap(),
        vocabulary: String::from_utf8(writers.vocabulary).unwrap(),
    }
}

/// id, primary, two extras; no header.
fn three_field_options(include_extra_fields: bool) -> CorpusOptions {
    CorpusOptions {
        fields: FieldSpec {
            delimiter: ",".to_string(),
            id_field: 0,
            primary_field: 1,
            extra_fields: 2..4,
        },
        include_extra_fields,
        skip_first_line: false,
        ..CorpusOptions::default()
    }
}

fn plain() -> Normalizer {
    Normalizer::new(&[], &[]).unwrap()
}

// ============================================================
// De-duplication and ordering
// ============================================================

#[test]
fn duplicate_id_absent_from_every_artifact() {
    let source = "7,orchard apples,red,\n8,harbour boats,blue,\n7,duplicate walrus,green,\n";
    let built = build(source, &plain(), three_field_options(true));

    assert_eq!(built.summary.documents_written, 2);
    assert_eq!(built.summary.duplicates_skipped, 1);
    for artifact in [&built.training, &built.bag_of_words, &built.words_per_document] {
        assert!(!artifact.contains("walrus"), "duplicate leaked into {artifact:?}");
    }
    assert!(!built.vocabulary.contains("walrus"));
}

#[test]
fn keep_duplicates_writes_every_occurrence() {
    let source = "7,orchard apples,,\n7,harbour boats,,\n";
    let options = CorpusOptions {
        ignore_duplicates: false,
        ..three_field_options(false)
    };
    let built = build(source, &plain(), options);
    assert_eq!(built.training, "7,X,orchard apples\n7,X,harbour boats\n");
}

#[test]
fn per_document_listing_follows_source_order() {
    let source = "30,gamma words,,\n10,alpha words,,\n20,beta words,,\n10,again,,\n";
    let built = build(source, &plain(), three_field_options(false));

    let ids: Vec<&str> = built
        .words_per_document
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(ids, vec!["30", "10", "20"]);
    assert_eq!(built.summary.document_ids, vec!["30", "10", "20"]);
}

// ============================================================
// Record filtering
// ============================================================

#[test]
fn header_blank_comment_and_empty_primary_lines_are_skipped() {
    let source = "id,text,e1,e2\n\n# note\n1,  ,x,y\n2,kept text,,\n";
    let options = CorpusOptions {
        skip_first_line: true,
        ..three_field_options(false)
    };
    let built = build(source, &plain(), options);

    assert_eq!(built.training, "2,X,kept text\n");
    assert_eq!(built.summary.empty_skipped, 1);
    assert_eq!(built.summary.lines_read, 2);
}

#[test]
fn empty_primary_does_not_claim_its_id() {
    let source = "5,,,\n5,second try,,\n";
    let built = build(source, &plain(), three_field_options(false));
    assert_eq!(built.training, "5,X,second try\n");
    assert_eq!(built.summary.duplicates_skipped, 0);
}

#[test]
fn short_records_are_malformed_not_fatal() {
    let source = "1\n2,fine text,,\n";
    let built = build(source, &plain(), three_field_options(false));
    assert_eq!(built.summary.malformed_skipped, 1);
    assert_eq!(built.summary.documents_written, 1);
}

#[test]
fn non_utf8_line_does_not_abort_the_build() {
    let source: &[u8] = b"1,good text\n2,cost \xa350 today\n3,more text\n";
    let options = CorpusOptions {
        fields: FieldSpec {
            delimiter: ",".to_string(),
            id_field: 0,
            primary_field: 1,
            extra_fields: 2..2,
        },
        skip_first_line: false,
        ..CorpusOptions::default()
    };
    let mut writers = CorpusWriters {
        training: Vec::new(),
        bag_of_words: Vec::new(),
        words_per_document: Vec::new(),
        vocabulary: Vec::new(),
    };
    let summary = CorpusBuilder::new(&plain(), options)
        .build_from_reader(source, &mut writers)
        .unwrap();

    assert_eq!(summary.documents_written, 3);
    assert_eq!(
        String::from_utf8(writers.training).unwrap(),
        "1,X,good text\n2,X,cost today\n3,X,more text\n"
    );
}

#[test]
fn lines_are_lower_cased_before_splitting() {
    let source = "AB-9,Mixed CASE Text,,\n";
    let built = build(source, &plain(), three_field_options(false));
    assert_eq!(built.training, "ab-9,X,mixed case text\n");
}

// ============================================================
// Extra fields
// ============================================================

#[test]
fn repeated_extra_values_are_written_once() {
    let source = "1,main text,gear,gear\n";
    let built = build(source, &plain(), three_field_options(true));
    assert_eq!(built.training, "1,X,main text gear\n");
    assert_eq!(built.words_per_document.lines().nth(1), Some("1,main text,gear"));
}

#[test]
fn empty_extra_range_gives_empty_extra_words() {
    let options = CorpusOptions {
        fields: FieldSpec {
            delimiter: ",".to_string(),
            id_field: 0,
            primary_field: 1,
            extra_fields: 2..2,
        },
        skip_first_line: false,
        include_extra_fields: true,
        ..CorpusOptions::default()
    };
    let built = build("1,only primary\n", &plain(), options);
    assert_eq!(built.training, "1,X,only primary\n");
    assert_eq!(built.words_per_document, "id,primary_field_words,extra_fields_words\n1,only primary,\n");
}

// ============================================================
// Vocabulary listing
// ============================================================

#[test]
fn vocabulary_sorted_by_count_then_word() {
    let source = "1,pear fig pear,,\n2,fig apple pear,,\n";
    let built = build(source, &plain(), three_field_options(false));

    // Blank extras still record one empty token per document
    let lines: Vec<&str> = built.vocabulary.lines().collect();
    assert_eq!(lines, vec!["word,count", "pear,3", ",2", "fig,2", "apple,1"]);
}

// ============================================================
// End-to-end normalization scenario
// ============================================================

#[test]
fn scenario_with_stop_words_email_url_and_number() {
    let normalizer = Normalizer::new(&parse_word_list("the|a\n"), &[]).unwrap();
    let source = "1,The Quick fox! a@b.com http://x.com 2023,extra1,extra2\n";

    let primary_only = build(source, &normalizer, three_field_options(false));
    // "a" is a stop word, so the email loses its local part before the
    // email step runs and its domain survives as "com"
    assert_eq!(primary_only.training, "1,X,quick fox com\n");

    let with_extra = build(source, &normalizer, three_field_options(true));
    assert_eq!(with_extra.training, "1,X,quick fox com extra extra\n");
    assert_eq!(with_extra.bag_of_words, "quick fox com extra extra\n");
}
