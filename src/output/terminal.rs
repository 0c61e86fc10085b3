// Colored terminal output for corpus summaries, topic distributions, and
// aggregation results.
//
// main.rs display code delegates here.

use colored::{ColoredString, Colorize};

use crate::aggregate::aggregator::TopicAssignments;
use crate::aggregate::composition::UNASSIGNED_TOPIC;
use crate::corpus::builder::CorpusSummary;
use crate::topics::lda::LdaModel;

/// Words shown beside each topic.
const TOP_WORDS_SHOWN: usize = 8;
/// Vocabulary entries shown after a corpus build.
const TOP_VOCABULARY_SHOWN: usize = 10;

/// Display what a corpus build kept and skipped.
pub fn display_corpus_summary(summary: &CorpusSummary) {
    println!("\n{}", "=== Corpus ===".bold());
    println!("  Lines read:          {}", summary.lines_read);
    println!("  Documents written:   {}", summary.documents_written);
    if summary.duplicates_skipped > 0 {
        println!("  Duplicate ids:       {}", summary.duplicates_skipped);
    }
    if summary.empty_skipped > 0 {
        println!("  Empty primary text:  {}", summary.empty_skipped);
    }
    if summary.malformed_skipped > 0 {
        println!(
            "  Malformed records:   {}",
            summary.malformed_skipped.to_string().yellow()
        );
    }
    println!("  Distinct words:      {}", summary.frequencies.len());

    let top = summary.frequencies.sorted_desc();
    if top.is_empty() {
        return;
    }
    println!("\n  {}", "Most frequent words:".dimmed());
    for (word, count) in top.into_iter().take(TOP_VOCABULARY_SHOWN) {
        let shown = if word.is_empty() { "(empty)" } else { word };
        println!("    {:<24} {:>6}", super::truncate_chars(shown, 24), count);
    }
}

/// Display a document's topic distribution, most probable first.
pub fn display_topic_distribution(model: &LdaModel, distribution: &[f64]) {
    let mut ranked: Vec<(usize, f64)> = distribution.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    println!(
        "\n{}",
        format!("=== Topic distribution ({} topics) ===", ranked.len()).bold()
    );
    println!();

    for (i, (topic, p)) in ranked.iter().enumerate() {
        let words: Vec<&str> = model
            .top_words(*topic, TOP_WORDS_SHOWN)
            .into_iter()
            .map(|(word, _)| word)
            .collect();
        let label = format!("{:>3}", topic);
        let label = if i == 0 { label.green().bold() } else { label.normal() };
        println!(
            "  {} {} {:.4}  {}",
            label,
            super::proportion_bar(*p, 20),
            p,
            words.join(" ").dimmed()
        );
    }
}

/// Display how many documents each topic received.
pub fn display_assignment_summary(assignments: &TopicAssignments) {
    println!(
        "\n{}",
        format!(
            "=== Topic assignments ({} documents) ===",
            assignments.per_document.len()
        )
        .bold()
    );

    for topic in assignments.combined.topic_numbers() {
        let count = assignments.documents_in_topic(topic);
        let label = topic_label(topic);
        let categories = assignments
            .level(1)
            .and_then(|level| level.topic(topic))
            .map_or(0, |counts| counts.len());
        println!(
            "  {} {:>6} documents  {}",
            label,
            count,
            format!("{categories} level-1 categories").dimmed()
        );
    }

    if assignments.skipped > 0 {
        println!(
            "  {} {} records could not be parsed",
            "!".yellow(),
            assignments.skipped
        );
    }
}

/// Fixed-width topic label. Padded before colouring so escape codes don't
/// count toward the column width.
fn topic_label(topic: i32) -> ColoredString {
    if topic == UNASSIGNED_TOPIC {
        format!("{:<12}", "unassigned").yellow()
    } else {
        format!("{:<12}", format!("topic {topic}")).normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_labels_share_one_width() {
        colored::control::set_override(true);
        let unassigned = topic_label(UNASSIGNED_TOPIC);
        let assigned = topic_label(3);

        assert_eq!(&*unassigned, "unassigned  ");
        assert_eq!(&*assigned, "topic 3     ");
        // The visible padding sits inside the escape codes
        assert!(unassigned.to_string().contains("unassigned  \u{1b}[0m"));
        colored::control::unset_override();
    }
}
