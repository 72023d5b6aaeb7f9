//! Authentication error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// No valid credential could be produced. Fatal to a batch run.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid client secrets file {}: {reason}", path.display())]
    InvalidClientSecrets { path: PathBuf, reason: String },

    #[error("authorization code unavailable: {0}")]
    CodeUnavailable(String),

    #[error("authorization code exchange rejected: {0}")]
    ExchangeRejected(String),

    #[error("token refresh rejected: {0}")]
    RefreshRejected(String),

    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    #[error("credential store error: {0}")]
    Store(#[from] CredentialStoreError),
}

/// Failures reading or writing the credential file.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to replace credential file: {0}")]
    Persist(String),
}
