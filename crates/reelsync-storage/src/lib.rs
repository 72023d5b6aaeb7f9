//! Reelsync Storage Library
//!
//! This crate provides the remote storage abstraction the upload pipeline
//! talks to. It includes the `RemoteStorage` trait, the fixed media-type
//! table, the permission batch and two backends: a Drive-compatible HTTP
//! client and a local filesystem store.
//!
//! # Remote layout
//!
//! Every task gets one container holding its files:
//!
//! - **Container**: named after the task's source directory
//! - **Blob**: one per uploaded file, named after the local file
//!
//! Media types are resolved from the file extension before any network call;
//! unknown extensions are rejected with `UploadError::UnsupportedFileType`.

pub mod batch;
#[cfg(feature = "storage-drive")]
pub mod drive;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod media;
#[cfg(feature = "storage-drive")]
pub(crate) mod multipart;
pub mod traits;

// Re-export commonly used types
pub use batch::{BatchItemResult, PermissionBatch};
#[cfg(feature = "storage-drive")]
pub use drive::DriveStorage;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use media::media_type_for;
pub use reelsync_core::StorageBackend;
pub use traits::{RemoteStorage, StorageError, StorageResult};
