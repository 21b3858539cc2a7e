//! Command-line front end: train a model from a tagged corpus, decode
//! untagged sentences with it, or measure its accuracy on a gold corpus.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hmm_core::{
    corpus::{read_corpus, read_sentences},
    eval::evaluate,
    tagger::write_results,
    DecodeOptions, DecodeResult, EstimatorConfig, HmmError, HmmModel, HmmTagger,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser)]
#[command(name = "hmm-tagger")]
#[command(about = "Train and apply a first-order HMM part-of-speech tagger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Worker threads for parallel work (0 = one per core)
    #[arg(short = 'j', long, global = true, default_value_t = 0)]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate a model from a word/tag corpus
    Train {
        /// Tagged corpus, one sentence per line
        corpus: PathBuf,

        /// The file to write the trained model to
        #[arg(short, long, default_value = "hmmmodel.txt")]
        model: PathBuf,

        /// Count the corpus in parallel shards of this many sentences
        #[arg(long)]
        shard_size: Option<usize>,
    },
    /// Tag untagged sentences
    Decode {
        /// Untagged sentences, one per line
        input: PathBuf,

        /// The model file to use
        #[arg(short, long, default_value = "hmmmodel.txt")]
        model: PathBuf,

        /// The file to write word/tag lines to
        #[arg(short, long, default_value = "hmmoutput.txt")]
        output: PathBuf,

        /// Write an empty line for sentences that cannot be decoded instead of aborting
        #[arg(long)]
        keep_going: bool,
    },
    /// Report token accuracy on a word/tag corpus
    Evaluate {
        /// Gold tagged corpus
        gold: PathBuf,

        /// The model file to use
        #[arg(short, long, default_value = "hmmmodel.txt")]
        model: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("failed to configure the thread pool")?;
    }
    let options = DecodeOptions {
        parallel: cli.threads != 1,
    };

    match cli.command {
        Commands::Train {
            corpus,
            model,
            shard_size,
        } => train(&corpus, &model, EstimatorConfig { shard_size }),
        Commands::Decode {
            input,
            model,
            output,
            keep_going,
        } => decode(&input, &model, &output, options, keep_going),
        Commands::Evaluate { gold, model } => {
            let tagger = HmmTagger::new(load_model(&model)?);
            let gold = read_corpus(BufReader::new(open(&gold)?))
                .with_context(|| format!("failed to read corpus {}", gold.display()))?;
            let eval = evaluate(&tagger, &gold, options);
            info!(
                sentences = eval.sentences,
                failed = eval.failed_sentences,
                "evaluation finished"
            );
            println!("Accuracy: {:.4} ({}/{})", eval.accuracy(), eval.correct, eval.tokens);
            println!(
                "Unknown-word accuracy: {:.4} ({}/{})",
                eval.unknown_accuracy(),
                eval.unknown_correct,
                eval.unknown_tokens
            );
            Ok(())
        }
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn load_model(path: &Path) -> Result<HmmModel> {
    info!("Loading model {}...", path.display());
    let model = HmmModel::load(BufReader::new(open(path)?))
        .with_context(|| format!("failed to load model {}", path.display()))?;
    info!(tags = model.n_tags(), words = model.words().len(), "model loaded");
    Ok(model)
}

fn train(corpus_path: &Path, model_path: &Path, config: EstimatorConfig) -> Result<()> {
    info!("Loading corpus {}...", corpus_path.display());
    let corpus = read_corpus(BufReader::new(open(corpus_path)?))
        .with_context(|| format!("failed to read corpus {}", corpus_path.display()))?;
    info!(sentences = corpus.len(), "corpus loaded");

    let start = Instant::now();
    let model = hmm_core::estimate_with(&corpus, &config);
    info!(
        tags = model.n_tags(),
        words = model.words().len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "model estimated"
    );
    if model.is_degenerate() {
        warn!("corpus is empty; the model cannot decode anything");
    }

    let file = File::create(model_path)
        .with_context(|| format!("failed to create {}", model_path.display()))?;
    model
        .save(BufWriter::new(file))
        .with_context(|| format!("failed to write model {}", model_path.display()))?;
    info!("Model written to {}", model_path.display());
    Ok(())
}

fn decode(
    input: &Path,
    model_path: &Path,
    output: &Path,
    options: DecodeOptions,
    keep_going: bool,
) -> Result<()> {
    let tagger = HmmTagger::new(load_model(model_path)?);
    let sentences = read_sentences(BufReader::new(open(input)?))
        .with_context(|| format!("failed to read {}", input.display()))?;

    let start = Instant::now();
    let mut results = Vec::with_capacity(sentences.len());
    for (i, result) in tagger.tag_all(&sentences, options).into_iter().enumerate() {
        match result {
            Ok(result) => results.push(result),
            Err(e) if keep_going => {
                warn!(line = i + 1, error = %e, "sentence skipped");
                results.push(DecodeResult::default());
            }
            Err(e @ HmmError::AllZeroTerminalScores { .. }) => {
                bail!("line {}: {} (the sentence is probably too long)", i + 1, e)
            }
            Err(e) => return Err(e).with_context(|| format!("line {}", i + 1)),
        }
    }
    let elapsed = start.elapsed().as_secs_f64();
    info!(
        sentences = results.len(),
        elapsed_sec = elapsed,
        "decoding finished"
    );

    let file = File::create(output).with_context(|| format!("failed to create {}", output.display()))?;
    write_results(BufWriter::new(file), &results)
        .with_context(|| format!("failed to write {}", output.display()))?;
    info!("Output written to {}", output.display());
    Ok(())
}
