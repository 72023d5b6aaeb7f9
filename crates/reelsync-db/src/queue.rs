use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use uuid::Uuid;

use reelsync_core::models::UploadTask;

/// Persistent store of upload tasks and their retry state.
///
/// The orchestrator only transitions status; tasks are created by `enqueue`
/// and never deleted by a batch run.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, source_path: &Path, recipients: &[String]) -> Result<UploadTask>;

    /// Tasks still in the retry set, oldest first.
    async fn pending_tasks(&self) -> Result<Vec<UploadTask>>;

    async fn mark_uploading(&self, task_id: Uuid) -> Result<()>;

    /// Persist the container created for a task so a retry can reuse it.
    async fn record_container(&self, task_id: Uuid, container_id: &str) -> Result<()>;

    /// Persist that `file_name` is committed into the task's container.
    async fn record_uploaded(&self, task_id: Uuid, file_name: &str) -> Result<()>;

    /// Remove the task from the retry set.
    async fn mark_succeeded(&self, task_id: Uuid) -> Result<()>;

    /// Keep the task in the retry set with the captured error.
    async fn mark_failed(&self, task_id: Uuid, error: &str) -> Result<()>;

    /// Every task regardless of status, oldest first.
    async fn list(&self) -> Result<Vec<UploadTask>>;
}
