//! `MailVault` - email archive importer.
//!
//! Normalizes semi-structured email-export JSON files into a
//! relational archive of participants, emails, recipient links,
//! attachments, and duplicate clusters.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail, ensure};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailvault_core::{Database, ImportTask, Importer, SystemClock};

#[derive(Parser)]
#[command(name = "mailvault", version, about = "Import email-export JSON files into the archive")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import export files into the archive database.
    Import(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// Directory containing the export files.
    #[arg(long, value_name = "DIR")]
    dir: PathBuf,

    /// Import a single file.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["files", "all", "range"])]
    file: Option<String>,

    /// Import specific files.
    #[arg(long, value_name = "FILE", num_args = 1.., conflicts_with_all = ["all", "range"])]
    files: Vec<String>,

    /// Import every .json file in the directory.
    #[arg(long, conflicts_with = "range")]
    all: bool,

    /// Import a zero-padded filename range, e.g. 3-17.
    #[arg(long, value_name = "N-M")]
    range: Option<String>,

    /// Archive database path (defaults to the user data directory).
    #[arg(long, value_name = "PATH", env = "MAILVAULT_DB")]
    database: Option<PathBuf>,

    /// Concurrent file workers.
    #[arg(long, default_value_t = 4)]
    jobs: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailvault=info,mailvault_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Import(args) => run_import(args).await,
    }
}

async fn run_import(args: ImportArgs) -> anyhow::Result<()> {
    let task = build_task(&args)?;
    let database_path = resolve_database_path(args.database)?;

    let db = Database::new(&database_path)
        .await
        .with_context(|| format!("opening archive database at {database_path}"))?;
    let importer = Importer::new(&db, Arc::new(SystemClock)).with_workers(args.jobs);

    info!(files = task.files.len(), directory = %task.directory.display(), "starting import");
    let summary = importer.run(task).await;

    println!(
        "imported {}  skipped {}  failed {}",
        summary.imported, summary.skipped, summary.failed
    );
    Ok(())
}

fn build_task(args: &ImportArgs) -> anyhow::Result<ImportTask> {
    if let Some(file) = &args.file {
        Ok(ImportTask::new(&args.dir, vec![file.clone()]))
    } else if !args.files.is_empty() {
        Ok(ImportTask::new(&args.dir, args.files.clone()))
    } else if args.all {
        Ok(ImportTask::all_files(&args.dir)?)
    } else if let Some(range) = &args.range {
        Ok(ImportTask::new(&args.dir, expand_range(range)?))
    } else {
        bail!("specify one of --file, --files, --all, or --range");
    }
}

/// Expands `N-M` into zero-padded filenames (`00003.json` ...).
fn expand_range(range: &str) -> anyhow::Result<Vec<String>> {
    let (start, end) = range
        .split_once('-')
        .context("range must look like N-M, e.g. 3-17")?;
    let start: u32 = start.trim().parse().context("range start is not a number")?;
    let end: u32 = end.trim().parse().context("range end is not a number")?;
    ensure!(start <= end, "range start exceeds range end");

    Ok((start..=end).map(|n| format!("{n:05}.json")).collect())
}

fn resolve_database_path(explicit: Option<PathBuf>) -> anyhow::Result<String> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let data_dir = dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mailvault");
            std::fs::create_dir_all(&data_dir).context("creating data directory")?;
            data_dir.join("mailvault.db")
        }
    };
    Ok(path.display().to_string())
}
