//! Remote storage abstraction trait
//!
//! This module defines the RemoteStorage trait that all backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use reelsync_core::models::{PermissionGrant, RemoteBlob, RemoteContainer};
use reelsync_core::{RemoteServiceError, UploadError};
use std::path::Path;
use thiserror::Error;

/// Backend construction errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credential not usable: {0}")]
    InvalidCredential(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    BackendError(String),
}

/// Result type for backend construction
pub type StorageResult<T> = Result<T, StorageError>;

/// Remote storage abstraction trait
///
/// A backend is built once per batch run and exposes the three remote
/// operations the pipeline needs. Each call is atomic from the caller's point
/// of view: it either returns the created object or an error.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Create a container and return it with its remote id.
    async fn create_container(&self, name: &str) -> Result<RemoteContainer, RemoteServiceError>;

    /// Upload one local file into a container.
    ///
    /// The media type is resolved from the extension first; an unknown
    /// extension fails with `UploadError::UnsupportedFileType` without any
    /// network traffic.
    async fn upload_blob(&self, container_id: &str, path: &Path) -> Result<RemoteBlob, UploadError>;

    /// Submit permission grants in one round trip.
    ///
    /// The outer error means the round trip itself failed. Otherwise the
    /// returned vector holds exactly one outcome per grant, in input order,
    /// carrying the permission id or that item's error.
    async fn execute_batch(
        &self,
        grants: &[PermissionGrant],
    ) -> Result<Vec<Result<String, RemoteServiceError>>, RemoteServiceError>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
