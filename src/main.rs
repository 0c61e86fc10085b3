use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use topicmill::aggregate::aggregator::{Aggregator, AggregatorOptions};
use topicmill::aggregate::categories::CategoryMaps;
use topicmill::config::Config;
use topicmill::corpus::builder::{CorpusBuilder, CorpusOptions, CorpusSummary};
use topicmill::corpus::record::FieldSpec;
use topicmill::layout::WorkspaceLayout;
use topicmill::output::terminal;
use topicmill::text::frequency::WordFrequencyTable;
use topicmill::text::normalizer::Normalizer;
use topicmill::text::wordlist;
use topicmill::topics::lda::GibbsLda;
use topicmill::topics::report;
use topicmill::topics::traits::TopicEngine;

/// Topicmill: topic modeling for delimited text records.
///
/// Prepares a normalized training corpus from a delimited source file,
/// trains a topic model on it, scores new documents, and breaks the
/// model's topic assignments down by category.
#[derive(Parser)]
#[command(name = "topicmill", version, about)]
struct Cli {
    /// Working folder holding the source files and all artifacts
    /// (default: TOPICMILL_WORKING_DIR or data_analysis)
    #[arg(short = 'F', long = "folder", global = true)]
    folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// How the source file is read.
#[derive(Args)]
struct CorpusArgs {
    /// Source file name, relative to the working folder
    #[arg(short = 'f', long = "file")]
    file: String,

    /// Field holding the document id
    #[arg(long, default_value = "0")]
    id_field: usize,

    /// Field holding the primary text
    #[arg(long, default_value = "4")]
    primary_field: usize,

    /// First extra field (inclusive)
    #[arg(long, default_value = "5")]
    extra_first: usize,

    /// Last extra field (exclusive)
    #[arg(long, default_value = "9")]
    extra_last: usize,

    /// Append extra-field words to each training line
    #[arg(long)]
    include_extra: bool,

    /// Keep every occurrence of a repeated id
    #[arg(long)]
    keep_duplicates: bool,

    /// The source has no header line
    #[arg(long)]
    no_header: bool,

    /// Merge the built-in English stop words into the stop-word list
    #[arg(long)]
    builtin_stop_words: bool,
}

impl CorpusArgs {
    fn options(&self, delimiter: &str) -> CorpusOptions {
        CorpusOptions {
            fields: FieldSpec {
                delimiter: delimiter.to_string(),
                id_field: self.id_field,
                primary_field: self.primary_field,
                extra_fields: self.extra_first..self.extra_last,
            },
            include_extra_fields: self.include_extra,
            ignore_duplicates: !self.keep_duplicates,
            skip_first_line: !self.no_header,
            ..CorpusOptions::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a source file into the training corpus and word listings
    Prepare {
        #[command(flatten)]
        corpus: CorpusArgs,
    },

    /// Prepare the corpus, then train a topic model on it
    Train {
        #[command(flatten)]
        corpus: CorpusArgs,

        /// Number of topics to find (must be at least 1)
        #[arg(short = 'n', long = "topics", value_parser = clap::value_parser!(u32).range(1..))]
        topics: u32,

        /// Also aggregate topic assignments by the source's category fields
        #[arg(long)]
        aggregate: bool,
    },

    /// Score a document against the trained model
    Test {
        /// Document text to score
        #[arg(short = 'd', long = "document")]
        document: String,
    },

    /// Count documents per topic per category from a composition report
    Aggregate {
        /// Category file (id, level 1, level 2, level 3), relative to the working folder
        #[arg(short = 'c', long = "categories")]
        categories: String,

        /// Skip the category file's first line
        #[arg(long)]
        category_header: bool,

        /// Composition report (default: the trained model's report)
        #[arg(long)]
        composition: Option<PathBuf>,

        /// Field delimiter of the composition report
        #[arg(long, default_value = "\t")]
        delimiter: String,

        /// Characters stripped from the front of each document name
        #[arg(long, default_value = "0")]
        prefix_len: usize,

        /// Folder holding each document's content, bundled per topic when set
        #[arg(long)]
        content_root: Option<PathBuf>,
    },

    /// Show which artifacts exist in the working folder
    Status,
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("topicmill=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load()?.with_working_dir(cli.folder);
    let layout = config.layout();

    match cli.command {
        Commands::Prepare { corpus } => {
            println!("Preparing corpus...");
            let normalizer = build_normalizer(&config, corpus.builtin_stop_words)?;
            if let Some(summary) = prepare(&normalizer, &corpus, &config, &layout)? {
                terminal::display_corpus_summary(&summary);
                println!("\n{}", "Done".bold());
            }
        }

        Commands::Train {
            corpus,
            topics,
            aggregate,
        } => {
            println!("Training started...");
            let source = layout.source(&corpus.file);
            let categories = CategoryMaps::load(&source, &config.field_delimiter, false)?;

            let normalizer = build_normalizer(&config, corpus.builtin_stop_words)?;
            let Some(summary) = prepare(&normalizer, &corpus, &config, &layout)? else {
                return Ok(());
            };
            terminal::display_corpus_summary(&summary);

            let engine = GibbsLda::default();
            let trained = engine.train(&layout.training_corpus(), topics as usize)?;
            report::write_training_artifacts(&trained, &layout)?;
            println!(
                "\nModel with {} topics written to {}",
                trained.model.topic_count,
                layout.training_dir().display()
            );

            if aggregate {
                run_aggregation(
                    &categories,
                    AggregatorOptions::default(),
                    &layout.topic_composition(),
                    &layout,
                )?;
            }
            println!("{}", "Done".bold());
        }

        Commands::Test { document } => {
            println!("Testing started...");
            let model = report::load_model(&layout.model())?;

            let normalizer = build_normalizer(&config, false)?;
            let mut frequencies = WordFrequencyTable::new();
            let cleaned = normalizer.normalize(&document.to_lowercase(), &mut frequencies);
            info!(words = cleaned.split_whitespace().count(), "Normalized test document");

            let distribution = GibbsLda::default().infer_with(&model, &cleaned);
            terminal::display_topic_distribution(&model, &distribution);
            println!("\n{}", "Done".bold());
        }

        Commands::Aggregate {
            categories,
            category_header,
            composition,
            delimiter,
            prefix_len,
            content_root,
        } => {
            let maps = CategoryMaps::load(
                &layout.source(&categories),
                &config.field_delimiter,
                category_header,
            )?;
            let options = AggregatorOptions {
                delimiter,
                name_prefix_len: prefix_len,
                content_root,
            };
            let composition = composition.unwrap_or_else(|| layout.topic_composition());
            run_aggregation(&maps, options, &composition, &layout)?;
        }

        Commands::Status => {
            topicmill::status::show(&layout)?;
        }
    }

    Ok(())
}

/// Load both word lists and compile the normalizer once for the run.
fn build_normalizer(config: &Config, builtin_stop_words: bool) -> Result<Normalizer> {
    let mut stop_words = wordlist::load_word_list(&config.stop_words_path)?;
    if builtin_stop_words {
        wordlist::extend_with_builtin_english(&mut stop_words);
    }
    let other_words = wordlist::load_word_list(&config.other_words_path)?;
    Normalizer::new(&stop_words, &other_words).context("Failed to build text normalizer")
}

/// Run the corpus builder over `<working folder>/<file>`.
fn prepare(
    normalizer: &Normalizer,
    corpus: &CorpusArgs,
    config: &Config,
    layout: &WorkspaceLayout,
) -> Result<Option<CorpusSummary>> {
    let builder = CorpusBuilder::new(normalizer, corpus.options(&config.field_delimiter));
    builder.build(&layout.source(&corpus.file), layout)
}

fn run_aggregation(
    categories: &CategoryMaps,
    options: AggregatorOptions,
    composition: &std::path::Path,
    layout: &WorkspaceLayout,
) -> Result<()> {
    let aggregator = Aggregator::new(categories, options);
    let Some(assignments) = aggregator.aggregate(composition, layout)? else {
        println!(
            "No topic composition at {}. Run `topicmill train` first.",
            composition.display()
        );
        return Ok(());
    };
    assignments.write(layout)?;
    terminal::display_assignment_summary(&assignments);
    Ok(())
}
