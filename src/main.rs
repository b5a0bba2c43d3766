use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use spellmap::corpus;
use spellmap::{ChainedTable, Correction, Frequency, Ranker, RankerConfig, DEFAULT_BUCKETS};

/// Suggest corrections for a word, or for every misspelled word of a
/// document, ranked against word frequencies from a corpus.
#[derive(Parser)]
#[command(name = "spellmap", version, about)]
struct Cli {
    /// Corpus text used to count word frequencies.
    corpus: PathBuf,

    /// A document to check (any argument containing '.') or a single word.
    target: String,

    /// Bucket count of the corpus table.
    #[arg(long, default_value_t = DEFAULT_BUCKETS)]
    buckets: usize,

    /// Number of suggestions to keep per word.
    #[arg(long, default_value_t = 5)]
    suggestions: usize,

    /// Scan the whole corpus instead of stopping once the slate is close enough.
    #[arg(long)]
    no_early_stop: bool,

    /// Print every corpus word with its frequency before checking.
    #[arg(long)]
    dump: bool,
}

fn init_logger() {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .format_timestamp_millis()
        .parse_default_env();
    // Avoid panicking if the logger was already initialized elsewhere.
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let table = corpus::load(&cli.corpus, cli.buckets)
        .with_context(|| format!("Failed to build corpus from {}", cli.corpus.display()))?;
    info!("{} distinct words in {} buckets", table.len(), table.bucket_count());

    if cli.dump {
        table.for_each(|word, frequency| println!("{word:<30} {frequency}"));
    }

    let config = RankerConfig::default()
        .with_capacity(cli.suggestions.max(1))
        .with_early_stop(!cli.no_early_stop);
    let ranker = Ranker::new(config);

    if cli.target.contains('.') {
        check_document(&ranker, &table, &cli.target)
    } else {
        match check_word(&ranker, &table, &cli.target) {
            Some((word, correction)) => report(&word, &correction),
            None => println!("{}: not a word", cli.target),
        }
        Ok(())
    }
}

/// Normalize `raw` the way corpus tokens are; `None` if it is not a word.
fn check_word<'t>(
    ranker: &Ranker,
    table: &'t ChainedTable<Frequency>,
    raw: &str,
) -> Option<(String, Correction<'t>)> {
    let word = corpus::normalize(raw.as_bytes())?;
    let correction = ranker.correct(table, &word);
    Some((word, correction))
}

fn check_document(ranker: &Ranker, table: &ChainedTable<Frequency>, path: &str) -> Result<()> {
    let text = std::fs::read(path).with_context(|| format!("Failed to read {path}"))?;
    // Each distinct word is reported once.
    let mut checked: ChainedTable<()> = ChainedTable::with_buckets(table.bucket_count());
    let mut misspelled = 0usize;
    for word in corpus::tokens(&text) {
        if checked.contains_key(&word) {
            continue;
        }
        checked.put(&word, ())?;
        let correction = ranker.correct(table, &word);
        if let Correction::Suggestions(_) = correction {
            misspelled += 1;
            report(&word, &correction);
        }
    }
    println!("{misspelled} misspelled of {} distinct words", checked.len());
    Ok(())
}

fn report(word: &str, correction: &Correction<'_>) {
    match correction {
        Correction::Correct { frequency } => {
            println!("{word}: correct (seen {frequency} times)");
        }
        Correction::Suggestions(board) if board.is_empty() => {
            println!("{word}: no suggestions");
        }
        Correction::Suggestions(board) => {
            println!("{word}: did you mean");
            for c in board.iter() {
                println!("  {:<24} distance {}  frequency {}", c.word, c.distance, c.frequency);
            }
        }
    }
}
