//! Command-line client for the receipt extraction service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reciva_batch::{BatchEvent, BatchOrchestrator, SingleProcessor};
use reciva_client::ExtractionApi;
use reciva_core::entry::EntryStatus;
use reciva_core::receipt::ExtractionResult;

mod config;
use config::ClientConfig;

#[derive(Parser)]
#[command(name = "reciva", version, about = "Receipt extraction client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit one document and wait for its result.
    Process {
        file: PathBuf,
        /// Ask the service for an AI-generated summary.
        #[arg(long)]
        summary: bool,
    },
    /// Submit several documents as one batch and monitor progress.
    Bulk {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Ask the service for AI-generated summaries.
        #[arg(long)]
        summary: bool,
    },
    /// List prior extraction records.
    History,
    /// Download the original document for a stored receipt.
    Fetch {
        /// Receipt id, as listed by `history`.
        id: i64,
        /// Output path (defaults to `receipt-<id>`).
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Probe the extraction service.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reciva_batch=info,reciva_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    let api = Arc::new(ExtractionApi::new(config.api_base.clone()));

    match cli.command {
        Command::Process { file, summary } => run_process(api, &config, &file, summary).await,
        Command::Bulk { files, summary } => run_bulk(api, &config, &files, summary).await,
        Command::History => run_history(&api).await,
        Command::Fetch { id, output } => run_fetch(&api, id, output).await,
        Command::Health => run_health(&api).await,
    }
}

async fn run_process(
    api: Arc<ExtractionApi>,
    config: &ClientConfig,
    file: &Path,
    summary: bool,
) -> anyhow::Result<()> {
    let filename = file_name(file)?;
    let payload = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    let processor = SingleProcessor::new(api, config.single_config());

    // Mirror the status line to stderr while the job runs.
    let mut status = processor.subscribe_status();
    let status_task = tokio::spawn(async move {
        while status.changed().await.is_ok() {
            let line = status.borrow_and_update().clone();
            if !line.is_empty() {
                eprintln!("{line}");
            }
        }
    });

    let outcome = processor.process(&filename, payload, summary).await;
    status_task.abort();

    let result = outcome?;
    print_result(&filename, &result);
    Ok(())
}

async fn run_bulk(
    api: Arc<ExtractionApi>,
    config: &ClientConfig,
    files: &[PathBuf],
    summary: bool,
) -> anyhow::Result<()> {
    let orchestrator = BatchOrchestrator::new(api, config.poll_config());

    for file in files {
        let filename = file_name(file)?;
        let payload = tokio::fs::read(file)
            .await
            .with_context(|| format!("failed to read {}", file.display()))?;
        orchestrator.add_file(filename, payload).await;
    }

    let mut events = orchestrator.subscribe();
    let submitted = orchestrator.submit(summary).await?;
    if submitted == 0 {
        anyhow::bail!("the service accepted none of the files");
    }
    eprintln!("submitted {submitted} file(s)");

    loop {
        match events.recv().await {
            Ok(BatchEvent::ProgressUpdated(progress)) => match progress.eta_seconds {
                Some(eta) => eprintln!(
                    "{}/{} done, ~{eta}s remaining",
                    progress.completed_count, progress.total_count
                ),
                None => eprintln!(
                    "{}/{} done",
                    progress.completed_count, progress.total_count
                ),
            },
            Ok(BatchEvent::BatchSettled(progress)) => {
                eprintln!(
                    "batch settled: {}/{} done",
                    progress.completed_count, progress.total_count
                );
                break;
            }
            Ok(_) => {}
            // A slow terminal only misses progress lines; keep reading.
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    for entry in orchestrator.entries().await {
        match entry.status {
            EntryStatus::Success => {
                if let Some(result) = &entry.result {
                    print_result(&entry.filename, result);
                }
            }
            EntryStatus::Error => {
                println!(
                    "{}: failed: {}",
                    entry.filename,
                    entry.error.as_deref().unwrap_or("unknown error")
                );
            }
            _ => {}
        }
    }

    Ok(())
}

async fn run_history(api: &ExtractionApi) -> anyhow::Result<()> {
    let records = api.fetch_history().await?;
    if records.is_empty() {
        println!("no prior extractions");
        return Ok(());
    }

    for record in records {
        let merchant = record.merchant.as_deref().unwrap_or("-");
        let total = record
            .total
            .map(|t| format!("{t:.2}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "#{:<5} {:<10} {:<30} {:<24} {:>10}",
            record.id, record.status, record.filename, merchant, total
        );
    }
    Ok(())
}

async fn run_fetch(api: &ExtractionApi, id: i64, output: Option<PathBuf>) -> anyhow::Result<()> {
    let bytes = api
        .fetch_receipt_file(id)
        .await
        .with_context(|| format!("failed to fetch receipt {id}"))?;

    let path = output.unwrap_or_else(|| PathBuf::from(format!("receipt-{id}")));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("wrote {} byte(s) to {}", bytes.len(), path.display());
    Ok(())
}

async fn run_health(api: &ExtractionApi) -> anyhow::Result<()> {
    api.check_health()
        .await
        .with_context(|| format!("service offline at {}", api.base_url()))?;
    println!("ok: {}", api.base_url());
    Ok(())
}

fn file_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_owned)
        .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", path.display()))
}

fn print_result(filename: &str, result: &ExtractionResult) {
    println!("{filename}:");
    if let Some(merchant) = &result.merchant {
        println!("  merchant: {merchant}");
    }
    if let Some(date) = &result.date {
        println!("  date:     {date}");
    }
    for (label, value) in [
        ("total:", result.total),
        ("subtotal:", result.subtotal),
        ("tax:", result.tax),
        ("tip:", result.tip),
        ("discount:", result.discount),
    ] {
        if let Some(amount) = value {
            println!("  {label:<9} {amount:.2}");
        }
    }
    if !result.tags.is_empty() {
        println!("  tags:     {}", result.tags.join(", "));
    }
    if let Some(summary) = &result.summary {
        println!("  summary:");
        for line in summary.lines() {
            println!("    {line}");
        }
    }
}
