use anyhow::{Context, Result};
use reelsync_core::models::UploadTask;
use reelsync_core::UploadError;
use reelsync_db::TaskQueue;
use reelsync_storage::{media_type_for, RemoteStorage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;

use crate::log_rotator::LogRotator;
use crate::report::Report;
use crate::sharer::{share, ShareSummary};

/// Result of driving one task through the upload sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded {
        container_id: String,
        shares: ShareSummary,
        /// Set when the local directory could not be deleted afterwards.
        cleanup_error: Option<String>,
    },
    /// The source directory is gone but a container was recorded earlier.
    AlreadyUploaded { container_id: String },
    /// The task stays in the retry set with this error recorded.
    Failed { error: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, TaskOutcome::Failed { .. })
    }
}

/// Counts and report of one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub log_uploaded: bool,
    pub report: Report,
}

/// A batch stopped by a queue or filesystem error, with what it got done.
#[derive(Debug, thiserror::Error)]
#[error("Upload batch aborted: {error:#}")]
pub struct BatchAborted {
    pub summary: BatchSummary,
    pub error: anyhow::Error,
}

/// Drives pending tasks through create, upload, share and cleanup, one task
/// at a time.
pub struct UploadOrchestrator {
    storage: Arc<dyn RemoteStorage>,
    queue: Arc<dyn TaskQueue>,
    rotator: LogRotator,
    excluded_file_names: Vec<String>,
}

impl UploadOrchestrator {
    pub fn new(
        storage: Arc<dyn RemoteStorage>,
        queue: Arc<dyn TaskQueue>,
        rotator: LogRotator,
        excluded_file_names: Vec<String>,
    ) -> Self {
        Self {
            storage,
            queue,
            rotator,
            excluded_file_names,
        }
    }

    /// Process `tasks` in order, then rotate the log once.
    ///
    /// A task failure is recorded in the queue and the batch moves on. Errors
    /// from the queue or the local filesystem stop the remaining tasks; the
    /// log is still rotated and the partial summary comes back in
    /// [`BatchAborted`].
    pub async fn run_batch(&self, tasks: &[UploadTask]) -> Result<BatchSummary, BatchAborted> {
        let start = Instant::now();
        let mut summary = BatchSummary::default();
        let mut aborted = None;

        tracing::info!(tasks = tasks.len(), "Starting upload batch");

        for task in tasks {
            let outcome = match self.process_task(task).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        task_id = %task.id,
                        source_path = %task.source_path.display(),
                        error = %e,
                        "Upload batch aborted"
                    );
                    aborted = Some(e);
                    break;
                }
            };
            summary.report.push(report_line(task, &outcome));
            if outcome.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
        }

        let rotation = self.rotator.rotate_and_upload(self.storage.as_ref()).await;
        summary.log_uploaded = rotation.uploaded;
        summary.report.push(rotation.line);

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            log_uploaded = summary.log_uploaded,
            aborted = aborted.is_some(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload batch finished"
        );

        match aborted {
            Some(error) => Err(BatchAborted { summary, error }),
            None => Ok(summary),
        }
    }

    /// Drive a single task and persist its new status.
    pub async fn process_task(&self, task: &UploadTask) -> Result<TaskOutcome> {
        self.queue.mark_uploading(task.id).await?;

        let source_exists = fs::try_exists(&task.source_path)
            .await
            .with_context(|| format!("Failed to stat {}", task.source_path.display()))?;
        if !source_exists {
            return self.source_missing(task).await;
        }

        match self.attempt(task).await? {
            Ok((container_id, shares)) => {
                self.queue.mark_succeeded(task.id).await?;
                tracing::info!(
                    task_id = %task.id,
                    container_id = %container_id,
                    "Task uploaded successfully"
                );

                let cleanup_error = match fs::remove_dir_all(&task.source_path).await {
                    Ok(()) => {
                        tracing::debug!(
                            task_id = %task.id,
                            source_path = %task.source_path.display(),
                            "Uploaded directory removed from local storage"
                        );
                        None
                    }
                    Err(e) => {
                        tracing::warn!(
                            task_id = %task.id,
                            source_path = %task.source_path.display(),
                            error = %e,
                            "Failed to remove uploaded directory"
                        );
                        Some(e.to_string())
                    }
                };
                Ok(TaskOutcome::Succeeded {
                    container_id,
                    shares,
                    cleanup_error,
                })
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task.id,
                    source_path = %task.source_path.display(),
                    error_code = e.error_code(),
                    error = %e,
                    "Uploading task failed, will retry later"
                );
                let error = e.to_string();
                self.queue.mark_failed(task.id, &error).await?;
                Ok(TaskOutcome::Failed { error })
            }
        }
    }

    /// A task whose source directory disappeared between runs.
    async fn source_missing(&self, task: &UploadTask) -> Result<TaskOutcome> {
        match &task.container_id {
            Some(container_id) => {
                tracing::info!(
                    task_id = %task.id,
                    container_id = %container_id,
                    "Source directory gone after earlier upload, marking task succeeded"
                );
                self.queue.mark_succeeded(task.id).await?;
                Ok(TaskOutcome::AlreadyUploaded {
                    container_id: container_id.clone(),
                })
            }
            None => {
                let error = format!(
                    "source directory {} does not exist",
                    task.source_path.display()
                );
                tracing::warn!(task_id = %task.id, error = %error, "Uploading task failed, will retry later");
                self.queue.mark_failed(task.id, &error).await?;
                Ok(TaskOutcome::Failed { error })
            }
        }
    }

    /// Container, uploads and sharing for one task.
    ///
    /// The outer error aborts the batch; the inner one fails only this task.
    async fn attempt(
        &self,
        task: &UploadTask,
    ) -> Result<std::result::Result<(String, ShareSummary), UploadError>> {
        let files = self.source_files(&task.source_path).await?;

        // Reject unsupported files before anything reaches the network.
        for file in &files {
            if let Err(e) = media_type_for(file) {
                return Ok(Err(e));
            }
        }

        let container_id = match &task.container_id {
            Some(id) => {
                tracing::debug!(task_id = %task.id, container_id = %id, "Reusing container from earlier attempt");
                id.clone()
            }
            None => match self.storage.create_container(&task.container_name()).await {
                Ok(container) => {
                    self.queue.record_container(task.id, &container.id).await?;
                    container.id
                }
                Err(e) => return Ok(Err(e.into())),
            },
        };

        if let Err(e) = self.upload_all(task, &container_id, &files).await? {
            return Ok(Err(e));
        }

        match share(self.storage.as_ref(), &container_id, &task.recipients).await {
            Ok(shares) => Ok(Ok((container_id, shares))),
            Err(e) => Ok(Err(e.into())),
        }
    }

    /// Upload every file the container does not hold yet, recording each one.
    async fn upload_all(
        &self,
        task: &UploadTask,
        container_id: &str,
        files: &[PathBuf],
    ) -> Result<std::result::Result<(), UploadError>> {
        for file in files {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            if task.is_uploaded(&name) {
                tracing::debug!(path = %file.display(), "Already in container, skipping");
                continue;
            }

            match self.storage.upload_blob(container_id, file).await {
                Ok(blob) => {
                    tracing::debug!(
                        path = %file.display(),
                        blob_id = %blob.id,
                        media_type = %blob.media_type,
                        "File uploaded"
                    );
                    self.queue.record_uploaded(task.id, &name).await?;
                }
                Err(e) if e.is_task_failure() => return Ok(Err(e)),
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Ok(()))
    }

    /// Regular files directly under `dir`, sorted by name, minus excluded names.
    async fn source_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir)
            .await
            .with_context(|| format!("Failed to read source directory {}", dir.display()))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("Failed to read source directory {}", dir.display()))?
        {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.excluded_file_names.iter().any(|n| *n == name) {
                tracing::debug!(file = %name, "Skipping excluded file");
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        Ok(files)
    }
}

fn report_line(task: &UploadTask, outcome: &TaskOutcome) -> String {
    let name = task.source_path.display();
    match outcome {
        TaskOutcome::Succeeded {
            container_id,
            shares,
            cleanup_error,
        } => {
            let shared_with = if task.recipients.is_empty() {
                "no one".to_string()
            } else {
                task.recipients.join(", ")
            };
            let mut line = format!(
                "{} successfully uploaded (container id = {}), and shared with {}.",
                name, container_id, shared_with
            );
            if !shares.failed.is_empty() {
                let failed: Vec<&str> = shares.failed.iter().map(|f| f.grantee.as_str()).collect();
                line.push_str(&format!(" Sharing failed for {}.", failed.join(", ")));
            }
            if let Some(e) = cleanup_error {
                line.push_str(&format!(" Local copy could not be removed: {}.", e));
            }
            line
        }
        TaskOutcome::AlreadyUploaded { container_id } => format!(
            "{} was already uploaded (container id = {}); local copy no longer present.",
            name, container_id
        ),
        TaskOutcome::Failed { error } => {
            format!("{} uploading failed due to following error: {}", name, error)
        }
    }
}
