//! Mock remote storage implementation for testing

use async_trait::async_trait;
use reelsync_core::models::{PermissionGrant, RemoteBlob, RemoteContainer};
use reelsync_core::{RemoteServiceError, StorageBackend, UploadError};
use reelsync_storage::{media_type_for, RemoteStorage};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A remote call that reached the (mock) network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    CreateContainer(String),
    UploadBlob { container_id: String, file_name: String },
    Batch(Vec<String>),
}

/// In-memory remote service recording every call.
#[derive(Clone, Default)]
pub struct MockRemoteStorage {
    calls: Arc<Mutex<Vec<RemoteCall>>>,
    container_seq: Arc<Mutex<u32>>,
    fail_create_names: Arc<Mutex<HashSet<String>>>,
    fail_upload_names: Arc<Mutex<HashSet<String>>>,
    rejected_grantees: Arc<Mutex<HashSet<String>>>,
    fail_batch: Arc<Mutex<bool>>,
}

impl MockRemoteStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Container creation for `name` fails with a malformed-response error.
    pub fn fail_create(&self, name: &str) {
        self.fail_create_names.lock().unwrap().insert(name.to_string());
    }

    /// Uploads of files called `file_name` fail with an interrupted transfer.
    pub fn fail_upload(&self, file_name: &str) {
        self.fail_upload_names.lock().unwrap().insert(file_name.to_string());
    }

    /// Uploads of `file_name` work again.
    pub fn restore_upload(&self, file_name: &str) {
        self.fail_upload_names.lock().unwrap().remove(file_name);
    }

    /// Grants for `grantee` are rejected inside an otherwise successful batch.
    pub fn reject_grantee(&self, grantee: &str) {
        self.rejected_grantees.lock().unwrap().insert(grantee.to_string());
    }

    /// The whole batch round trip fails.
    pub fn fail_batch(&self) {
        *self.fail_batch.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads_into(&self, container_id: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RemoteCall::UploadBlob {
                    container_id: c,
                    file_name,
                } if c == container_id => Some(file_name),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStorage for MockRemoteStorage {
    async fn create_container(&self, name: &str) -> Result<RemoteContainer, RemoteServiceError> {
        self.record(RemoteCall::CreateContainer(name.to_string()));
        if self.fail_create_names.lock().unwrap().contains(name) {
            return Err(RemoteServiceError::MalformedResponse(
                "container response has no id".to_string(),
            ));
        }
        let mut seq = self.container_seq.lock().unwrap();
        *seq += 1;
        Ok(RemoteContainer {
            id: format!("container-{}", *seq),
            name: name.to_string(),
            parent_id: None,
        })
    }

    async fn upload_blob(&self, container_id: &str, path: &Path) -> Result<RemoteBlob, UploadError> {
        let media_type = media_type_for(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(RemoteCall::UploadBlob {
            container_id: container_id.to_string(),
            file_name: file_name.clone(),
        });
        if self.fail_upload_names.lock().unwrap().contains(&file_name) {
            return Err(RemoteServiceError::TransferInterrupted {
                committed: 0,
                total: 1,
                reason: "connection reset".to_string(),
            }
            .into());
        }
        Ok(RemoteBlob {
            id: format!("{}/{}", container_id, file_name),
            name: file_name,
            parent_container_id: container_id.to_string(),
            media_type: media_type.to_string(),
        })
    }

    async fn execute_batch(
        &self,
        grants: &[PermissionGrant],
    ) -> Result<Vec<Result<String, RemoteServiceError>>, RemoteServiceError> {
        self.record(RemoteCall::Batch(
            grants.iter().map(|g| g.grantee_identity.clone()).collect(),
        ));
        if *self.fail_batch.lock().unwrap() {
            return Err(RemoteServiceError::UnsupportedMethod("batch disabled".to_string()));
        }
        let rejected = self.rejected_grantees.lock().unwrap();
        Ok(grants
            .iter()
            .enumerate()
            .map(|(i, grant)| {
                if rejected.contains(&grant.grantee_identity) {
                    Err(RemoteServiceError::MalformedRequest(format!(
                        "cannot share with {}",
                        grant.grantee_identity
                    )))
                } else {
                    Ok(format!("perm-{}", i))
                }
            })
            .collect())
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
