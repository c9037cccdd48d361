//! blobmover CLI - move large objects between storage locations.

use std::process::ExitCode;
use std::sync::Arc;

use blobmover_locator::{Locator, LocatorError};
use blobmover_transfer::{
    DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, NoOpObserver, ProgressObserver, StoreError,
    TransferError, TransferReport, TransferRequest, Transferor,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "blobmover")]
#[command(about = "Move a large object between storage locations in parallel parts")]
#[command(version)]
struct Cli {
    /// Source object URL (s3://, gs://, azure://, file://, or a plain path)
    source: String,

    /// Destination object URL
    destination: String,

    /// Number of parallel transfer workers
    #[arg(short = 't', long = "threads", default_value_t = DEFAULT_CONCURRENCY)]
    threads: usize,

    /// Part-size ceiling in bytes
    #[arg(long, default_value_t = DEFAULT_PART_SIZE)]
    part_size: u64,

    /// Disable the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Print the transfer report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Locator(#[from] LocatorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Transfer(#[from] TransferError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli).await {
        Ok(report) => {
            print_report(&cli, &report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to move object: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<TransferReport, CliError> {
    let source_loc = Locator::parse(&cli.source)?;
    let dest_loc = Locator::parse(&cli.destination)?;

    let source = blobmover_store::open_source(&source_loc).await?;
    let dest = blobmover_store::open_dest(&dest_loc).await?;

    let observer: Arc<dyn ProgressObserver> = if cli.no_progress {
        Arc::new(NoOpObserver)
    } else {
        Arc::new(BarObserver::new())
    };

    let request = TransferRequest {
        max_part_size: cli.part_size,
        concurrency: cli.threads,
        ..TransferRequest::default()
    };
    let report = Transferor::new(request)
        .run(source, dest, Arc::clone(&observer))
        .await?;

    Ok(report)
}

fn print_report(cli: &Cli, report: &TransferReport) {
    if let Some(ref delete_error) = report.delete_error {
        warn!(error = %delete_error, "source object was not deleted");
        eprintln!("warning: destination finalized but source was not deleted: {delete_error}");
    }

    if cli.json {
        match serde_json::to_string_pretty(report) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("failed to encode report: {err}"),
        }
    } else {
        println!(
            "Moved {} bytes in {} part(s) in {:.2}s",
            report.bytes_copied, report.parts, report.elapsed_secs
        );
    }
}

/// Progress observer rendering an indicatif byte bar on stderr.
///
/// The total is only known once the engine has queried the source
/// size, so the bar length is set on the first notification.
struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Self { bar }
    }
}

impl ProgressObserver for BarObserver {
    fn on_bytes(&self, copied: u64, total: u64) {
        if self.bar.length() != Some(total) {
            self.bar.set_length(total);
        }
        self.bar.set_position(copied);
        if copied >= total {
            self.bar.finish_and_clear();
        }
    }
}
