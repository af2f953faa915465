//! CLI entry point for training and querying the news classifier.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::path::PathBuf;
use tracing::{error, info};
use truebot_learning::{
    Algorithm, ArtifactLocator, DATA_PATH_ENV, DEFAULT_DATA_PATH, DEFAULT_MODEL_DIR,
    MODEL_DIR_ENV, ModelCache, TrainingConfig,
};

#[derive(Parser, Debug)]
#[command(
    author = "TrueBot Team",
    version,
    about = "Real/fake news classifier",
    long_about = "Trains TF-IDF classifiers on a labeled news corpus and labels new text.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  TRUEBOT_DATA_PATH     Training corpus (default: data/news.csv)\n  \
                  TRUEBOT_MODEL_DIR     Artifact directory (default: model)\n  \
                  RUST_LOG              Log filter, overrides --log-level\n\n\
                  EXAMPLES:\n  \
                  # Train every candidate and store the best\n  \
                  truebot train --data data/news.csv\n\n  \
                  # Label a sentence (trains first if no model is stored)\n  \
                  truebot predict --text \"The ministry confirmed the budget.\""
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the labeled CSV corpus (`text` and `label` columns)
    #[arg(short, long, global = true, env = DATA_PATH_ENV, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// Directory holding model.json and vectorizer.json
    #[arg(short, long, global = true, env = MODEL_DIR_ENV, default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train all candidates and persist the most accurate one
    Train {
        /// Only train this family (log_reg, random_forest, gradient_boosting)
        #[arg(long)]
        algorithm: Option<Algorithm>,

        /// Seed for the split and every model
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Fraction of rows held out for scoring
        #[arg(long, default_value = "0.2")]
        test_size: f64,
    },
    /// Label a single text
    Predict {
        /// Text to classify
        #[arg(short, long)]
        text: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr so stdout only carries the JSON result.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Load .env first so it can feed the env-backed defaults below
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level);

    let outcome = match &args.command {
        Command::Train {
            algorithm,
            seed,
            test_size,
        } => run_train(&args, *algorithm, *seed, *test_size),
        Command::Predict { text } => run_predict(&args, text),
    };

    if let Err(ref e) = outcome {
        error!("{:#}", e);
    }
    outcome
}

fn run_train(args: &Args, algorithm: Option<Algorithm>, seed: u64, test_size: f64) -> Result<()> {
    let mut builder = TrainingConfig::builder()
        .random_seed(seed)
        .test_size(test_size);
    if let Some(algorithm) = algorithm {
        builder = builder.algorithm(algorithm);
    }
    let config = builder.build()?;

    info!(
        "Training from {} into {}",
        args.data.display(),
        args.model_dir.display()
    );
    let scores = truebot_learning::train(&args.data, &args.model_dir, &config)
        .with_context(|| format!("training on {} failed", args.data.display()))?;

    println!("{}", serde_json::to_string_pretty(&scores)?);
    Ok(())
}

fn run_predict(args: &Args, text: &str) -> Result<()> {
    let locator = ArtifactLocator::new(&args.model_dir, &args.data);
    let result = ModelCache::global()
        .predict(text, &locator)
        .context("prediction failed")?;

    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
