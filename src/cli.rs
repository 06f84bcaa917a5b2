use crate::config::{NotarizerConfig, ReceiptFormat};
use crate::error::{NotarizerError, NotarizerResult};
use crate::evidence::{PdfReceiptRenderer, ReceiptRenderer, ReceiptWriter, TextReceiptRenderer};
use crate::ledger::{LedgerBackend, NotarizerFactory};
use crate::app_log;
use crate::logger::{LogLevel, Logger, LoggerGuard, RotatingLogSink};
use crate::pipeline::{Orchestrator, PipelineReport};
use crate::watcher::{event_channel, DirectoryWatcher, DEFAULT_EVENT_CAPACITY};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(
    name = "notarizer",
    version,
    about = "Watch a directory and notarize every new file on the ledger"
)]
pub struct Cli {
    /// JSON configuration file; defaults apply when omitted
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Watch the input directory until Ctrl-C.
    Watch {
        #[arg(long)]
        watch_dir: Option<PathBuf>,

        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Use the simulated ledger instead of the ledger tool.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the pipeline once for a single file.
    Notarize {
        file: PathBuf,

        #[arg(long)]
        dry_run: bool,
    },

    /// Write a configuration file with default values.
    InitConfig {
        file: PathBuf,

        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Execute a parsed command line and return the process exit code
pub async fn run(cli: Cli) -> NotarizerResult<i32> {
    match cli.command {
        Command::InitConfig { file, force } => init_config(&file, force),
        Command::Watch {
            watch_dir,
            output_dir,
            log_file,
            dry_run,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(dir) = watch_dir {
                config.watch_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(file) = log_file {
                config.log.file = file;
            }
            if dry_run {
                config.ledger.backend = LedgerBackend::Mock;
            }
            watch_directory(config).await
        }
        Command::Notarize { file, dry_run } => {
            let mut config = load_config(cli.config.as_deref())?;
            if dry_run {
                config.ledger.backend = LedgerBackend::Mock;
            }
            notarize_once(config, &file).await
        }
    }
}

pub fn load_config(path: Option<&Path>) -> NotarizerResult<NotarizerConfig> {
    match path {
        Some(path) => NotarizerConfig::load(path),
        None => Ok(NotarizerConfig::default()),
    }
}

fn init_config(file: &Path, force: bool) -> NotarizerResult<i32> {
    if file.exists() && !force {
        return Err(NotarizerError::ConfigError(format!(
            "{} already exists (use --force to overwrite)",
            file.display()
        )));
    }
    NotarizerConfig::default().save(file)?;
    println!("Wrote default configuration to {}", file.display());
    Ok(0)
}

/// File-backed logger configured from `config.log`
pub fn start_logger(config: &NotarizerConfig) -> NotarizerResult<(Logger, LoggerGuard)> {
    let sink = RotatingLogSink::open(
        &config.log.file,
        config.log.max_lines,
        config.log.backup_count,
    )?;
    let (logger, guard) = Logger::new(Some(sink));
    logger.set_min_level(config.log.level);
    Ok((logger, guard))
}

pub fn build_orchestrator(
    config: &NotarizerConfig,
    logger: Logger,
) -> NotarizerResult<Orchestrator> {
    let notarizer = NotarizerFactory::create(&config.ledger, logger.clone())?;
    let renderer: Box<dyn ReceiptRenderer> = match config.receipt_format {
        ReceiptFormat::Pdf => Box::new(PdfReceiptRenderer),
        ReceiptFormat::Text => Box::new(TextReceiptRenderer),
    };

    Ok(Orchestrator::new(
        config.stability.detector(),
        config.hash_algorithm,
        notarizer,
        config.ledger.clone(),
        ReceiptWriter::new(&config.output_dir, renderer),
        logger,
    ))
}

async fn watch_directory(config: NotarizerConfig) -> NotarizerResult<i32> {
    config.validate()?;
    config.ensure_directories()?;

    let (logger, _guard) = start_logger(&config)?;
    let orchestrator = build_orchestrator(&config, logger.clone())?;

    let (event_tx, event_rx) = event_channel(DEFAULT_EVENT_CAPACITY);
    let watcher = DirectoryWatcher::start(&config.watch_dir, event_tx, logger.clone())?;
    app_log!(
        logger,
        LogLevel::Info,
        "Monitoring directory: {} (notarizer: {})",
        config.watch_dir.display(),
        orchestrator.notarizer_name()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_logger = logger.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                signal_logger.error(&format!("Failed to listen for Ctrl-C: {}", e), "main");
                // Keep the sender alive so the orchestrator is not told to stop.
                std::future::pending::<()>().await;
            }
        }
    });

    let processed = orchestrator.run(event_rx, shutdown_rx).await;
    drop(watcher);
    app_log!(logger, LogLevel::Info, "Processed {} file(s)", processed);
    Ok(0)
}

async fn notarize_once(config: NotarizerConfig, file: &Path) -> NotarizerResult<i32> {
    if !file.is_file() {
        return Err(NotarizerError::FileNotFound(file.display().to_string()));
    }
    config.validate()?;
    config.ensure_directories()?;

    let (logger, _guard) = start_logger(&config)?;
    let orchestrator = build_orchestrator(&config, logger)?;

    let path = file.canonicalize()?;
    let report = orchestrator.process_file(path, chrono::Local::now()).await;
    print_report(&report);

    Ok(if report.is_done() { 0 } else { 1 })
}

fn print_report(report: &PipelineReport) {
    println!("File:    {}", report.path.display());
    println!("State:   {}", report.final_state);
    if let Some(digest) = &report.digest {
        println!("Hash:    {}", digest);
    }
    if let Some(outcome) = &report.outcome {
        match outcome.reference() {
            Some(reference) => println!("Ledger:  {}", reference),
            None => println!(
                "Ledger:  failed ({})",
                outcome.error().unwrap_or("no reference returned")
            ),
        }
    }
    if let Some(receipt) = &report.receipt_path {
        println!("Receipt: {}", receipt.display());
    }
    if let Some(error) = &report.error {
        println!("Error:   {}", error);
    }
}
