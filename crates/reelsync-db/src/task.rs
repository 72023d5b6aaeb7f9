use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use reelsync_core::models::{TaskStatus, UploadTask};

use crate::queue::TaskQueue;

const TASK_COLUMNS: &str = r#"
    id,
    source_path,
    recipients,
    status,
    last_error,
    container_id,
    uploaded_files,
    retry_count,
    created_at,
    updated_at
"#;

#[derive(sqlx::FromRow)]
struct UploadTaskRow {
    id: String,
    source_path: String,
    recipients: String,
    status: String,
    last_error: Option<String>,
    container_id: Option<String>,
    uploaded_files: String,
    retry_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UploadTaskRow> for UploadTask {
    type Error = anyhow::Error;

    fn try_from(row: UploadTaskRow) -> Result<Self> {
        Ok(UploadTask {
            id: Uuid::parse_str(&row.id).context("Invalid task id")?,
            source_path: PathBuf::from(row.source_path),
            recipients: serde_json::from_str(&row.recipients)
                .context("Invalid recipients column")?,
            status: row.status.parse::<TaskStatus>()?,
            last_error: row.last_error,
            container_id: row.container_id,
            uploaded_files: serde_json::from_str(&row.uploaded_files)
                .context("Invalid uploaded_files column")?,
            retry_count: row.retry_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// SQLite-backed task queue over the `upload_tasks` table.
#[derive(Clone)]
pub struct SqliteTaskQueue {
    pool: SqlitePool,
}

impl SqliteTaskQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database at `database_url` and apply migrations.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid DATABASE_URL: {}", database_url))?
            .create_if_missing(true);

        if let Some(parent) = options.get_filename().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create database directory {}", parent.display())
                })?;
            }
        }

        // One connection: the pipeline is sequential and an in-memory database
        // only exists per connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to open task database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run task database migrations")?;

        tracing::debug!(database_url = %database_url, "Task database ready");
        Ok(Self::new(pool))
    }

    async fn fetch(&self, filter: &str) -> Result<Vec<UploadTask>> {
        let sql = format!(
            "SELECT {} FROM upload_tasks {} ORDER BY created_at, rowid",
            TASK_COLUMNS, filter
        );
        let rows: Vec<UploadTaskRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch upload tasks")?;

        rows.into_iter().map(UploadTask::try_from).collect()
    }

    async fn update_status(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        last_error: Option<&str>,
        increment_retry: bool,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE upload_tasks
            SET status = ?1,
                last_error = ?2,
                retry_count = retry_count + ?3,
                updated_at = ?4
            WHERE id = ?5
            "#,
        )
        .bind(status.to_string())
        .bind(last_error)
        .bind(i32::from(increment_retry))
        .bind(Utc::now())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, task_id = %task_id, status = %status, "Failed to update task status");
            anyhow::anyhow!("Failed to update task status: {}", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("Task {} not found", task_id));
        }

        tracing::debug!(task_id = %task_id, status = %status, "Task status updated");
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for SqliteTaskQueue {
    #[tracing::instrument(skip(self))]
    async fn enqueue(&self, source_path: &Path, recipients: &[String]) -> Result<UploadTask> {
        let task = UploadTask::new(source_path, recipients.to_vec());
        let recipients_json =
            serde_json::to_string(&task.recipients).context("Failed to encode recipients")?;

        sqlx::query(
            r#"
            INSERT INTO upload_tasks (
                id, source_path, recipients, status, last_error,
                container_id, uploaded_files, retry_count, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, NULL, NULL, '[]', 0, ?5, ?6)
            "#,
        )
        .bind(task.id.to_string())
        .bind(task.source_path.to_string_lossy().into_owned())
        .bind(recipients_json)
        .bind(task.status.to_string())
        .bind(task.created_at)
        .bind(task.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, source_path = %source_path.display(), "Failed to insert upload task");
            anyhow::anyhow!("Failed to insert upload task: {}", e)
        })?;

        tracing::info!(
            task_id = %task.id,
            source_path = %source_path.display(),
            recipients = task.recipients.len(),
            "Upload task enqueued"
        );

        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    async fn pending_tasks(&self) -> Result<Vec<UploadTask>> {
        self.fetch("WHERE status IN ('pending', 'uploading', 'failed')")
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn mark_uploading(&self, task_id: Uuid) -> Result<()> {
        self.update_status(task_id, TaskStatus::Uploading, None, false)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn record_container(&self, task_id: Uuid, container_id: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE upload_tasks SET container_id = ?1, uploaded_files = '[]', updated_at = ?2 WHERE id = ?3",
        )
        .bind(container_id)
        .bind(Utc::now())
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .context("Failed to record container id")?;

        if result.rows_affected() == 0 {
            return Err(anyhow::anyhow!("Task {} not found", task_id));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn record_uploaded(&self, task_id: Uuid, file_name: &str) -> Result<()> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT uploaded_files FROM upload_tasks WHERE id = ?1")
                .bind(task_id.to_string())
                .fetch_optional(&self.pool)
                .await
                .context("Failed to read uploaded files")?;
        let raw = raw.ok_or_else(|| anyhow::anyhow!("Task {} not found", task_id))?;

        let mut files: Vec<String> =
            serde_json::from_str(&raw).context("Invalid uploaded_files column")?;
        if files.iter().any(|f| f == file_name) {
            return Ok(());
        }
        files.push(file_name.to_string());

        sqlx::query("UPDATE upload_tasks SET uploaded_files = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(serde_json::to_string(&files).context("Failed to encode uploaded files")?)
            .bind(Utc::now())
            .bind(task_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to record uploaded file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn mark_succeeded(&self, task_id: Uuid) -> Result<()> {
        self.update_status(task_id, TaskStatus::Succeeded, None, false)
            .await
    }

    #[tracing::instrument(skip(self, error))]
    async fn mark_failed(&self, task_id: Uuid, error: &str) -> Result<()> {
        self.update_status(task_id, TaskStatus::Failed, Some(error), true)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<UploadTask>> {
        self.fetch("").await
    }
}
