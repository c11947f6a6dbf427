//! Application entry point — meeting code-switching dataset generator.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Parse the command line.
//! 3. Load [`AppConfig`] (defaults on first run) and apply CLI overrides.
//! 4. Validate the configuration; nothing is generated when it is invalid.
//! 5. Build the pronunciation engine and the HTTP generator.
//! 6. Install the ctrl-c handler that cancels the run.
//! 7. Run the generation loop, save the dataset, print both reports.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;

use meeting_codeswitch::{
    config::{AppConfig, AppPaths, PronunciationConfig},
    dataset::{load_dataset, save_dataset, Validator},
    llm::{ApiGenerator, TextGenerator},
    pipeline::DatasetRunner,
    pronunciation::{PronunciationEngine, PronunciationRules},
};

/// Sample count used by `--test`.
const TEST_SIZE: usize = 5;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Generate Vietnamese–English code-switching meeting sentences",
    long_about = None
)]
struct Cli {
    /// Settings file (defaults to ./settings.toml, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of samples to generate
    #[arg(short = 'n', long)]
    size: Option<usize>,

    /// Generate a small trial dataset
    #[arg(long)]
    test: bool,

    /// Seed for scenario sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Validate an existing dataset file and exit
    #[arg(long, value_name = "FILE")]
    validate: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.dataset.output_file = output.clone();
        }
        if let Some(size) = self.size {
            config.dataset.size = size;
        }
        if self.test {
            config.dataset.size = TEST_SIZE;
        }
        if let Some(seed) = self.seed {
            config.generation.seed = Some(seed);
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn load_engine(config: &PronunciationConfig) -> anyhow::Result<PronunciationEngine> {
    match &config.rules_file {
        Some(path) => {
            let rules = PronunciationRules::load_from(path)?;
            log::info!("loaded pronunciation rules from {}", path.display());
            Ok(PronunciationEngine::new(rules))
        }
        None => Ok(PronunciationEngine::builtin()),
    }
}

fn validate_file(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
    let records =
        load_dataset(path).with_context(|| format!("cannot read dataset {}", path.display()))?;
    log::info!("validating {} records from {}", records.len(), path.display());

    let engine = Arc::new(load_engine(&config.pronunciation)?);
    let validator = Validator::from_config(&config.pronunciation, engine);
    println!("{}", validator.validate_dataset(&records));
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Command line
    let cli = Cli::parse();

    // 3. Configuration
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().locate_settings(Path::new(".")));
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("cannot load settings from {}", config_path.display()))?;
    cli.apply(&mut config);

    if let Some(path) = &cli.validate {
        return validate_file(path, &config);
    }

    // 4. Validation before any external call
    if let Err(e) = config.validate() {
        log::error!("invalid configuration: {e}");
        return Err(e.into());
    }
    log::info!(
        "meeting-codeswitch starting: {} samples with {} → {}",
        config.dataset.size,
        config.llm.model,
        config.dataset.output_file.display()
    );

    // 5. Engine and generator
    let engine = Arc::new(load_engine(&config.pronunciation)?);
    let generator: Arc<dyn TextGenerator> = Arc::new(ApiGenerator::from_config(&config.llm));

    // 6. Ctrl-c cancels the run; records accepted so far are kept
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupt received; keeping records accepted so far");
            let _ = cancel_tx.send(true);
        }
    });

    // 7. Run
    let mut runner =
        DatasetRunner::new(generator, Arc::clone(&engine), &config)?.with_cancel(cancel_rx);
    let (records, stats) = runner.generate_dataset(config.dataset.size).await;

    if let Err(e) = save_dataset(&config.dataset.output_file, &records) {
        log::error!("cannot write dataset: {e}");
        return Err(e.into());
    }

    let validator = Validator::from_config(&config.pronunciation, engine);
    println!("{stats}");
    println!();
    println!("{}", validator.validate_dataset(&records));

    Ok(())
}
