//! reelsync: upload recording folders, share them and keep the retry queue.
//!
//! Configuration comes from the environment (and `.env`); see `Config`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelsync_auth::{Authenticator, TokenProvider};
use reelsync_cli::{parse_recipients, print_json, TaskRow};
use reelsync_core::{Config, StorageBackend};
use reelsync_db::{SqliteTaskQueue, TaskQueue};
use reelsync_infra::{init_telemetry, notifier_from_config};
use reelsync_storage::create_storage;
use reelsync_worker::{BatchAborted, LogRotator, UploadOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "reelsync", about = "Upload and share recordings")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire a credential (interactively if needed) and store it
    Auth,
    /// Queue a recording folder for upload
    Enqueue {
        /// Folder to upload
        path: PathBuf,
        /// Recipients granted read access (comma or space separated)
        #[arg(long = "share", num_args = 0..)]
        share: Vec<String>,
    },
    /// List every task in the queue
    List,
    /// Upload all pending tasks, then rotate the log
    Run,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "reelsync failed");
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_telemetry(&config.log.file_path)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    match cli.command {
        Commands::Auth => {
            let notifier = notifier_from_config(&config)?;
            let authenticator = Authenticator::from_config(&config.auth, notifier)?;
            authenticator.acquire().await?;
            println!(
                "Credential stored at {}",
                config.auth.credential_path.display()
            );
        }
        Commands::Enqueue { path, share } => {
            let path = std::fs::canonicalize(&path)
                .with_context(|| format!("{} does not exist", path.display()))?;
            if !path.is_dir() {
                anyhow::bail!("{} is not a directory", path.display());
            }
            let queue = SqliteTaskQueue::connect(&config.database_url).await?;
            let task = queue.enqueue(&path, &parse_recipients(&share)).await?;
            print_json(&TaskRow::from(&task))?;
        }
        Commands::List => {
            let queue = SqliteTaskQueue::connect(&config.database_url).await?;
            let rows: Vec<TaskRow> = queue.list().await?.iter().map(TaskRow::from).collect();
            print_json(&rows)?;
        }
        Commands::Run => return run_batch(&config).await,
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_batch(config: &Config) -> anyhow::Result<ExitCode> {
    let notifier = notifier_from_config(config)?;

    let tokens: Option<Arc<dyn TokenProvider>> = match config.storage_backend {
        StorageBackend::Drive => {
            let authenticator = Authenticator::from_config(&config.auth, notifier.clone())?;
            // The authenticator already alerted the operator.
            let credential = authenticator.acquire().await?;
            Some(Arc::new(authenticator.session(credential)))
        }
        StorageBackend::Local => None,
    };

    let storage = create_storage(config, tokens).await?;
    let queue = Arc::new(SqliteTaskQueue::connect(&config.database_url).await?);
    let tasks = queue.pending_tasks().await?;

    let orchestrator = UploadOrchestrator::new(
        storage,
        queue,
        LogRotator::new(&config.log.file_path, &config.log.container_id),
        config.excluded_file_names.clone(),
    );
    let summary = match orchestrator.run_batch(&tasks).await {
        Ok(summary) => summary,
        Err(BatchAborted { summary, error }) => {
            summary
                .report
                .alert(notifier.as_ref(), &format!("{:#}", error))
                .await;
            println!("{}", summary.report.body());
            return Err(error.context("Upload batch aborted"));
        }
    };

    summary.report.flush(notifier.as_ref()).await;
    println!("{}", summary.report.body());

    if summary.failed > 0 {
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}
