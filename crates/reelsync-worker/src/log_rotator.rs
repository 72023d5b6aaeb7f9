//! Rotation of the operational log into the remote log container.

use chrono::{DateTime, Local};
use reelsync_storage::RemoteStorage;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of one rotation; `line` is the report line describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRotation {
    pub uploaded: bool,
    pub line: String,
}

/// Snapshots the live log, uploads the snapshot and truncates the live log
/// once the upload is confirmed.
#[derive(Debug, Clone)]
pub struct LogRotator {
    live_log: PathBuf,
    container_id: String,
}

impl LogRotator {
    pub fn new(live_log: impl Into<PathBuf>, container_id: impl Into<String>) -> Self {
        Self {
            live_log: live_log.into(),
            container_id: container_id.into(),
        }
    }

    pub async fn rotate_and_upload(&self, storage: &dyn RemoteStorage) -> LogRotation {
        self.rotate_at(storage, Local::now()).await
    }

    /// Rotate using `now` for the snapshot name.
    ///
    /// Never fails: every problem is logged and reflected in the returned
    /// report line. The live log is left untouched unless the upload
    /// succeeded, and the snapshot is always removed.
    pub async fn rotate_at(&self, storage: &dyn RemoteStorage, now: DateTime<Local>) -> LogRotation {
        let snapshot = self.snapshot_path(now);

        if let Err(e) = fs::copy(&self.live_log, &snapshot).await {
            tracing::warn!(
                live_log = %self.live_log.display(),
                snapshot = %snapshot.display(),
                error = %e,
                "Failed to snapshot log file"
            );
            // A failed copy can leave a partial file behind.
            remove_snapshot(&snapshot).await;
            return self.failed(format!("snapshot failed: {}", e));
        }

        let rotation = match storage.upload_blob(&self.container_id, &snapshot).await {
            Ok(blob) => match truncate(&self.live_log).await {
                Ok(()) => {
                    tracing::debug!(
                        blob_id = %blob.id,
                        container_id = %self.container_id,
                        "Logs uploaded to log container"
                    );
                    LogRotation {
                        uploaded: true,
                        line: format!(
                            "Logs uploaded to log container {} (file id = {}).",
                            self.container_id, blob.id
                        ),
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        live_log = %self.live_log.display(),
                        error = %e,
                        "Logs uploaded but live log could not be truncated"
                    );
                    LogRotation {
                        uploaded: true,
                        line: format!(
                            "Logs uploaded to log container {} (file id = {}), but the live log could not be truncated: {}",
                            self.container_id, blob.id, e
                        ),
                    }
                }
            },
            Err(e) => {
                tracing::warn!(
                    container_id = %self.container_id,
                    error = %e,
                    "Uploading logs failed"
                );
                self.failed(e.to_string())
            }
        };

        remove_snapshot(&snapshot).await;
        rotation
    }

    /// `<stem>_%d%m%Y_%H%M.log` next to the live log.
    fn snapshot_path(&self, now: DateTime<Local>) -> PathBuf {
        let stem = self
            .live_log
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "reelsync".to_string());
        let name = format!("{}_{}.log", stem, now.format("%d%m%Y_%H%M"));
        match self.live_log.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn failed(&self, reason: String) -> LogRotation {
        LogRotation {
            uploaded: false,
            line: format!(
                "WARNING: uploading logs to log container {} failed: {}",
                self.container_id, reason
            ),
        }
    }
}

async fn truncate(path: &Path) -> std::io::Result<()> {
    let file = fs::OpenOptions::new().write(true).open(path).await?;
    file.set_len(0).await
}

async fn remove_snapshot(snapshot: &Path) {
    match fs::remove_file(snapshot).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(snapshot = %snapshot.display(), error = %e, "Failed to remove log snapshot");
        }
    }
}
