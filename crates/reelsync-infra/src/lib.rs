//! Reelsync Infrastructure Library
//!
//! This crate provides the shared infrastructure around the upload pipeline:
//! - Telemetry initialization (console plus the live log file)
//! - Operator notification (SMTP email or log-only)

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod notify;

// Re-export commonly used types
#[cfg(feature = "observability-basic")]
pub use telemetry::init_telemetry;

#[cfg(feature = "email")]
pub use notify::EmailNotifier;
pub use notify::{notifier_from_config, LogNotifier, NotifyError};
