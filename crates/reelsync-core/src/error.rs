//! Error types module
//!
//! Errors raised while a task's create/upload/share sequence runs. Remote and
//! file-type failures are recovered at task granularity: the task is marked
//! failed for a later retry and the batch moves on. Local I/O faults and queue
//! failures propagate out of the batch instead.

use std::path::PathBuf;

/// Failure of a single remote call.
#[derive(Debug, thiserror::Error)]
pub enum RemoteServiceError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Resumable transfer interrupted after {committed} of {total} bytes: {reason}")]
    TransferInterrupted {
        committed: u64,
        total: u64,
        reason: String,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),
}

impl RemoteServiceError {
    /// Machine-readable code used in logs and report lines
    pub fn error_code(&self) -> &'static str {
        match self {
            RemoteServiceError::MalformedRequest(_) => "MALFORMED_REQUEST",
            RemoteServiceError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            RemoteServiceError::UnsupportedMethod(_) => "UNSUPPORTED_METHOD",
            RemoteServiceError::TransferInterrupted { .. } => "TRANSFER_INTERRUPTED",
            RemoteServiceError::Http { .. } => "HTTP_ERROR",
            RemoteServiceError::Transport(_) => "TRANSPORT_ERROR",
        }
    }

    /// Map a non-success HTTP status to the matching variant.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => RemoteServiceError::MalformedRequest(message),
            405 | 501 => RemoteServiceError::UnsupportedMethod(message),
            _ => RemoteServiceError::Http { status, message },
        }
    }
}

/// Failure of a task-level upload step.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error(transparent)]
    Remote(#[from] RemoteServiceError),

    #[error("Unsupported file type '{extension}' for {}", path.display())]
    UnsupportedFileType { path: PathBuf, extension: String },

    /// Reading the local file failed. Not a task failure: the batch aborts.
    #[error("Failed to read {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl UploadError {
    pub fn error_code(&self) -> &'static str {
        match self {
            UploadError::Remote(e) => e.error_code(),
            UploadError::UnsupportedFileType { .. } => "UNSUPPORTED_FILE_TYPE",
            UploadError::LocalIo { .. } => "LOCAL_IO",
        }
    }

    /// Whether the error is recovered by failing the task and retrying later.
    pub fn is_task_failure(&self) -> bool {
        !matches!(self, UploadError::LocalIo { .. })
    }
}
