use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, Level};

use music_analyzer::error::AudioError;
use music_analyzer::{AnalysisEngine, AnalyzerError, Config};

#[derive(Parser)]
#[command(
    name = "music-analyzer",
    version,
    about = "Rhythm, structure and classification analysis of music recordings",
    long_about = "Music Analyzer estimates tempo, beats and onsets, splits a track into labeled sections and, when models are available, classifies its genre, mood and tags. Results are printed as JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding genre.onnx, tags.onnx and mood.onnx with their .json metadata
    #[arg(short, long, global = true)]
    model_dir: Option<PathBuf>,

    /// Print compact instead of pretty JSON
    #[arg(long, global = true)]
    compact: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Tempo, beats and onsets
    Rhythm { audio: PathBuf },

    /// Labeled sections
    Structure { audio: PathBuf },

    /// Genre, mood and tags
    Classify { audio: PathBuf },

    /// Everything at once
    Full { audio: PathBuf },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays valid JSON
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Music Analyzer v{}", env!("CARGO_PKG_VERSION"));

    if let Err(err) = start(cli) {
        // Exit 2 for unreadable input, 1 for everything else
        let code = match err.downcast_ref::<AnalyzerError>() {
            Some(analyzer_err) => {
                error!("{}", analyzer_err.user_message());
                if analyzer_err.is_input_error() { 2 } else { 1 }
            }
            None => {
                error!("{:#}", err);
                1
            }
        };
        std::process::exit(code);
    }
}

fn start(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    if let Some(model_dir) = &cli.model_dir {
        config.classification.model_dir = Some(model_dir.clone());
    }
    config.validate()?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.service.worker_threads)
        .enable_all()
        .build()?;

    runtime.block_on(run(cli, config))
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    let engine = AnalysisEngine::new(config)?;

    match &cli.command {
        Command::Rhythm { audio } => {
            check_exists(audio)?;
            print_json(&engine.analyze_rhythm(audio).await?, cli.compact)
        }
        Command::Structure { audio } => {
            check_exists(audio)?;
            print_json(&engine.analyze_structure(audio).await?, cli.compact)
        }
        Command::Classify { audio } => {
            check_exists(audio)?;
            if !engine.has_classifier() {
                tracing::warn!("No classification models found, results will be placeholders");
            }
            print_json(&engine.classify(audio).await?, cli.compact)
        }
        Command::Full { audio } => {
            check_exists(audio)?;
            print_json(&engine.analyze_full(audio).await?, cli.compact)
        }
    }
}

fn check_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AnalyzerError::from(AudioError::LoadFailed {
            path: path.display().to_string(),
        }).into());
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{}", json);
    Ok(())
}
