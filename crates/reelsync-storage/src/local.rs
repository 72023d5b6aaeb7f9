use crate::media::media_type_for;
use crate::traits::{RemoteStorage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use reelsync_core::models::{PermissionGrant, RemoteBlob, RemoteContainer};
use reelsync_core::{RemoteServiceError, UploadError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const CONTAINER_FILE: &str = "container.json";
const PERMISSIONS_FILE: &str = "permissions.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredPermission {
    id: String,
    #[serde(flatten)]
    grant: PermissionGrant,
}

/// Local filesystem storage implementation
///
/// Each container is a directory `<base>/<container-id>/` holding the
/// uploaded files, a `container.json` descriptor and a `permissions.json`
/// list of grants.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for containers (e.g., "/var/lib/reelsync/remote")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Resolve a container id to its directory.
    ///
    /// Ids are single path components generated by `create_container`;
    /// anything that could escape the base directory is rejected.
    fn container_dir(&self, container_id: &str) -> Result<PathBuf, RemoteServiceError> {
        if container_id.is_empty()
            || container_id.contains("..")
            || container_id.contains('/')
            || container_id.contains('\\')
        {
            return Err(RemoteServiceError::MalformedRequest(format!(
                "invalid container id '{}'",
                container_id
            )));
        }
        Ok(self.base_path.join(container_id))
    }

    /// Directory of an existing container.
    async fn existing_container(&self, container_id: &str) -> Result<PathBuf, RemoteServiceError> {
        let dir = self.container_dir(container_id)?;
        if !fs::try_exists(dir.join(CONTAINER_FILE)).await.unwrap_or(false) {
            return Err(RemoteServiceError::Http {
                status: 404,
                message: format!("container {} not found", container_id),
            });
        }
        Ok(dir)
    }

    async fn grant(&self, grant: &PermissionGrant) -> Result<String, RemoteServiceError> {
        if grant.grantee_identity.trim().is_empty() || !grant.grantee_identity.contains('@') {
            return Err(RemoteServiceError::MalformedRequest(format!(
                "invalid grantee '{}'",
                grant.grantee_identity
            )));
        }

        let dir = self.existing_container(&grant.target_container_id).await?;
        let path = dir.join(PERMISSIONS_FILE);

        let mut permissions: Vec<StoredPermission> = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice(&raw)
                .map_err(|e| RemoteServiceError::MalformedResponse(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(backend(e)),
        };

        let id = Uuid::new_v4().simple().to_string();
        permissions.push(StoredPermission {
            id: id.clone(),
            grant: grant.clone(),
        });

        let data = serde_json::to_vec_pretty(&permissions)
            .map_err(|e| RemoteServiceError::MalformedRequest(e.to_string()))?;
        write_then_rename(&path, &data).await.map_err(backend)?;

        Ok(id)
    }
}

#[async_trait]
impl RemoteStorage for LocalStorage {
    async fn create_container(&self, name: &str) -> Result<RemoteContainer, RemoteServiceError> {
        let id = Uuid::new_v4().simple().to_string();
        let dir = self.container_dir(&id)?;
        fs::create_dir_all(&dir).await.map_err(backend)?;

        let container = RemoteContainer {
            id,
            name: name.to_string(),
            parent_id: None,
        };
        let data = serde_json::to_vec_pretty(&container)
            .map_err(|e| RemoteServiceError::MalformedRequest(e.to_string()))?;
        write_then_rename(&dir.join(CONTAINER_FILE), &data)
            .await
            .map_err(backend)?;

        tracing::info!(
            container_id = %container.id,
            name = %name,
            path = %dir.display(),
            "Local container created"
        );

        Ok(container)
    }

    async fn upload_blob(&self, container_id: &str, path: &Path) -> Result<RemoteBlob, UploadError> {
        let media_type = media_type_for(path)?;
        let dir = self.existing_container(container_id).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                RemoteServiceError::MalformedRequest(format!("{} has no file name", path.display()))
            })?;
        let start = Instant::now();

        let mut source = fs::File::open(path).await.map_err(|e| UploadError::LocalIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size = copy_then_rename(&mut source, &dir.join(&name))
            .await
            .map_err(backend)?;

        let id = format!("{}/{}", container_id, name);

        tracing::info!(
            path = %path.display(),
            blob_id = %id,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(RemoteBlob {
            id,
            name,
            parent_container_id: container_id.to_string(),
            media_type: media_type.to_string(),
        })
    }

    async fn execute_batch(
        &self,
        grants: &[PermissionGrant],
    ) -> Result<Vec<Result<String, RemoteServiceError>>, RemoteServiceError> {
        let mut outcomes = Vec::with_capacity(grants.len());
        for grant in grants {
            outcomes.push(self.grant(grant).await);
        }
        Ok(outcomes)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

fn backend(e: std::io::Error) -> RemoteServiceError {
    RemoteServiceError::Transport(e.to_string())
}

fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    PathBuf::from(partial)
}

/// Write to a partial sibling and rename over the target.
async fn write_then_rename(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let partial = partial_path(path);
    let mut file = fs::File::create(&partial).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    fs::rename(&partial, path).await
}

/// Stream `source` into a partial sibling, then rename over the target.
/// Returns the number of bytes copied.
async fn copy_then_rename(source: &mut fs::File, path: &Path) -> std::io::Result<u64> {
    let partial = partial_path(path);
    let mut file = fs::File::create(&partial).await?;
    let size = tokio::io::copy(source, &mut file).await?;
    file.sync_all().await?;
    fs::rename(&partial, path).await?;
    Ok(size)
}
