//! Reelsync Core Library
//!
//! This crate provides the domain models, error taxonomy, configuration and
//! notification hooks shared by every reelsync component: the authenticator,
//! the remote storage backends, the task queue and the upload orchestrator.

pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{AuthConfig, Config, DriveConfig, EmailConfig, LogConfig};
pub use error::{RemoteServiceError, UploadError};
pub use hooks::{NoOpNotifier, Notifier, Severity};
pub use storage_types::StorageBackend;
