//! scan-namer - descriptive names for scanner-default files
//!
//! Entry point for the scan agent.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::Parser;
use scan_namer::config::{DEFAULT_API_BASE, DEFAULT_MODEL};
use scan_namer::describe::{OpenAiDescriber, PopplerRasterizer};
use scan_namer::observability::init_tracing;
use scan_namer::orchestrator::NamingOrchestrator;
use scan_namer::scan::diagnose_folder;
use scan_namer::storage::ProcessedFileLedger;
use scan_namer::watcher::{RunMode, WatchLoop};
use scan_namer::{Config, Error, Result};

/// scan-namer - gives scanned documents descriptive file names
#[derive(Parser, Debug)]
#[command(name = "scan-namer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder the scanner app writes into
    #[arg(long, env = "SCAN_FOLDER_PATH")]
    folder: Option<PathBuf>,

    /// API key for the vision model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Vision model used to propose titles
    #[arg(long, env = "SCAN_NAMER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the chat-completions API
    #[arg(long, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Seconds between passes in continuous mode
    #[arg(long, env = "CHECK_INTERVAL", default_value = "60")]
    interval: u64,

    /// Keep watching the folder after the first pass
    #[arg(
        short,
        long,
        env = "CONTINUOUS_MONITORING",
        value_parser = BoolishValueParser::new(),
        default_value = "false"
    )]
    continuous: bool,

    /// Run a single pass and exit, even if continuous monitoring is enabled
    #[arg(short, long)]
    once: bool,

    /// Reprocess files already recorded in the ledger (first pass only)
    #[arg(short, long)]
    force: bool,

    /// List how every file in the scan folder is classified, then exit
    #[arg(short, long)]
    diagnostic: bool,

    /// Print the processed-file ledger as JSON, then exit
    #[arg(long)]
    ledger: bool,

    /// Data directory for the ledger database
    #[arg(long, env = "SCAN_NAMER_DATA_DIR", default_value = "./data")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SCAN_NAMER_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, env = "SCAN_NAMER_LOG_JSON")]
    log_json: bool,

    /// Also write logs to this file
    #[arg(long, env = "SCAN_NAMER_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before parsing so its values act as env fallbacks
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let _log_guard = init_tracing(&cli.log_level, cli.log_json, cli.log_file.as_deref())?;

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => tracing::debug!("No .env file found"),
        Err(e) => tracing::warn!(error = %e, "Failed to read .env file"),
    }

    tracing::info!("scan-namer v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config {
        scan_folder: cli.folder.unwrap_or_default(),
        api_key: cli.api_key.unwrap_or_default(),
        model: cli.model,
        api_base: cli.api_base,
        check_interval: Duration::from_secs(cli.interval),
        continuous: cli.continuous && !cli.once,
        force: cli.force,
        data_dir: cli.data_dir,
        log_level: cli.log_level,
    };

    tracing::debug!(?config, "Configuration loaded");

    if cli.diagnostic {
        config.validate_scan_folder()?;
        println!("Scan folder: {}", config.scan_folder.display());
        for entry in diagnose_folder(&config.scan_folder) {
            println!("{entry}");
        }
        return Ok(());
    }

    if cli.ledger {
        let ledger = ProcessedFileLedger::load(config.ledger_path());
        if !ledger.is_attached() {
            return Err(Error::internal(format!(
                "ledger at {} could not be opened",
                config.ledger_path().display()
            )));
        }
        let mut entries: Vec<_> = ledger.entries().collect();
        entries.sort_by_key(|e| (e.processed_at, e.original_path.clone()));
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| Error::internal(format!("failed to serialize ledger: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    config.validate()?;

    let describer = OpenAiDescriber::new(&config.api_key, &config.model, &config.api_base)?;
    let mode = RunMode::from_config(&config);
    let force = config.force;

    tracing::info!(
        folder = %config.scan_folder.display(),
        ?mode,
        force,
        "Processing scan folder"
    );

    let orchestrator =
        NamingOrchestrator::new(config, Arc::new(describer), Arc::new(PopplerRasterizer::new()));
    let passes = WatchLoop::new(orchestrator, mode, force).run().await;

    tracing::info!(passes, "scan-namer stopped");
    Ok(())
}
