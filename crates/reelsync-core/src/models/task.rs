use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Uploading,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// Statuses that still belong to the retry set.
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, TaskStatus::Succeeded)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Uploading => write!(f, "uploading"),
            TaskStatus::Succeeded => write!(f, "succeeded"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "uploading" => Ok(TaskStatus::Uploading),
            "succeeded" => Ok(TaskStatus::Succeeded),
            "failed" => Ok(TaskStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid task status: {}", s)),
        }
    }
}

/// One local recording folder waiting to be uploaded and shared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTask {
    pub id: Uuid,
    pub source_path: PathBuf,
    /// Recipient identities, in the order they were given.
    pub recipients: Vec<String>,
    pub status: TaskStatus,
    pub last_error: Option<String>,
    /// Remote container created by an earlier attempt, reused on retry.
    pub container_id: Option<String>,
    /// Files already committed into `container_id`, skipped on retry.
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    pub retry_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UploadTask {
    pub fn new(source_path: impl Into<PathBuf>, recipients: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            source_path: source_path.into(),
            recipients,
            status: TaskStatus::Pending,
            last_error: None,
            container_id: None,
            uploaded_files: Vec::new(),
            retry_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_uploaded(&self, file_name: &str) -> bool {
        self.uploaded_files.iter().any(|f| f == file_name)
    }

    /// Remote container name, derived from the source folder's base name.
    pub fn container_name(&self) -> String {
        base_name(&self.source_path)
    }
}

/// Base name of a path, falling back to the full display form when the path
/// has no final component (e.g. `/`).
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
