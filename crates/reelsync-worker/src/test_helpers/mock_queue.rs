//! In-memory task queue for testing without a database

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use reelsync_core::models::{TaskStatus, UploadTask};
use reelsync_db::TaskQueue;
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct MemoryTaskQueue {
    tasks: Arc<Mutex<Vec<UploadTask>>>,
    fail_updates: Arc<Mutex<bool>>,
    failing_task: Arc<Mutex<Option<Uuid>>>,
    fail_success: Arc<Mutex<bool>>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every status update fails from now on.
    pub fn fail_updates(&self) {
        *self.fail_updates.lock().unwrap() = true;
    }

    /// Updates to `id` fail from now on; other tasks are unaffected.
    pub fn fail_updates_for(&self, id: Uuid) {
        *self.failing_task.lock().unwrap() = Some(id);
    }

    /// Marking any task succeeded fails from now on.
    pub fn fail_mark_succeeded(&self) {
        *self.fail_success.lock().unwrap() = true;
    }

    pub fn get(&self, id: Uuid) -> Option<UploadTask> {
        self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    fn update(&self, id: Uuid, apply: impl FnOnce(&mut UploadTask)) -> Result<()> {
        if *self.fail_updates.lock().unwrap() || *self.failing_task.lock().unwrap() == Some(id) {
            return Err(anyhow!("task database unavailable"));
        }
        let mut tasks = self.tasks.lock().unwrap();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| anyhow!("Task {} not found", id))?;
        apply(task);
        task.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn enqueue(&self, source_path: &Path, recipients: &[String]) -> Result<UploadTask> {
        let task = UploadTask::new(source_path, recipients.to_vec());
        self.tasks.lock().unwrap().push(task.clone());
        Ok(task)
    }

    async fn pending_tasks(&self) -> Result<Vec<UploadTask>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.status.is_outstanding())
            .cloned()
            .collect())
    }

    async fn mark_uploading(&self, task_id: Uuid) -> Result<()> {
        self.update(task_id, |t| t.status = TaskStatus::Uploading)
    }

    async fn record_container(&self, task_id: Uuid, container_id: &str) -> Result<()> {
        self.update(task_id, |t| {
            t.container_id = Some(container_id.to_string());
            t.uploaded_files.clear();
        })
    }

    async fn record_uploaded(&self, task_id: Uuid, file_name: &str) -> Result<()> {
        self.update(task_id, |t| {
            if !t.is_uploaded(file_name) {
                t.uploaded_files.push(file_name.to_string());
            }
        })
    }

    async fn mark_succeeded(&self, task_id: Uuid) -> Result<()> {
        if *self.fail_success.lock().unwrap() {
            return Err(anyhow!("task database is read-only"));
        }
        self.update(task_id, |t| {
            t.status = TaskStatus::Succeeded;
            t.last_error = None;
        })
    }

    async fn mark_failed(&self, task_id: Uuid, error: &str) -> Result<()> {
        self.update(task_id, |t| {
            t.status = TaskStatus::Failed;
            t.last_error = Some(error.to_string());
            t.retry_count += 1;
        })
    }

    async fn list(&self) -> Result<Vec<UploadTask>> {
        Ok(self.tasks.lock().unwrap().clone())
    }
}
