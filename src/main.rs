//! Disk Chooser
//!
//! Reads a selection request (host facts plus requirements), picks the
//! matching block devices and writes the result document to stdout. Logs go
//! to stderr. The exit status tells configuration errors, allocation
//! shortfalls and collaborator failures apart.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncReadExt;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use disk_chooser::{
    Error, Orchestrator, Result, SelectionConfig, SelectionFailure, SelectionOutcome,
    SelectionRequest,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Disk Chooser - match discovered block devices against role requirements
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Request file (JSON, or YAML for .yaml/.yml); `-` reads JSON from stdin
    #[arg(long, env = "DISK_CHOOSER_REQUEST", default_value = "-")]
    request: String,

    /// Directory of persistent device aliases
    #[arg(long, env = "BY_ID_DIR", default_value = "/dev/disk/by-id")]
    by_id_dir: PathBuf,

    /// Directory of kernel block-device nodes
    #[arg(long, env = "DEV_DIR", default_value = "/dev")]
    dev_dir: PathBuf,

    /// lsblk binary used to probe existing partitions
    #[arg(long, env = "LSBLK", default_value = "lsblk")]
    lsblk: String,

    /// Partition label marking a previously prepared device
    #[arg(long, env = "PREPARED_LABEL", default_value = "ceph data")]
    prepared_label: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Pretty-print the result document
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            dev_dir: self.dev_dir.clone(),
            by_id_dir: self.by_id_dir.clone(),
            lsblk: self.lsblk.clone(),
            prepared_label: self.prepared_label.clone(),
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    info!("Starting disk chooser");
    info!("  Version: {}", disk_chooser::VERSION);
    info!("  Request: {}", args.request);

    match run(&args).await {
        Ok(outcome) => {
            print_document(&outcome, args.pretty);
            info!("End");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("FATAL: {}", e);
            print_document(&SelectionFailure::from(&e), args.pretty);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: &Args) -> Result<SelectionOutcome> {
    let request = load_request(&args.request).await?;
    let orchestrator = Orchestrator::new(args.selection_config());
    orchestrator.run(&request).await
}

async fn load_request(source: &str) -> Result<SelectionRequest> {
    if source == "-" {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        return SelectionRequest::from_json_str(&raw);
    }
    SelectionRequest::load(&PathBuf::from(source)).await
}

fn print_document<T: serde::Serialize>(document: &T, pretty: bool) {
    let rendered = if pretty {
        serde_json::to_string_pretty(document)
    } else {
        serde_json::to_string(document)
    };

    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to render result: {}", Error::from(e)),
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
