//! Hooks for operator notification
//!
//! The pipeline reports through this trait without depending on a concrete
//! delivery channel. `reelsync-infra` provides the SMTP and log-only
//! implementations.

use async_trait::async_trait;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// How urgently a notification needs an operator's attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// End-of-run report
    Info,
    /// Blocks all further work until an operator acts (e.g. re-authentication)
    Critical,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Delivers operator-facing messages
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, severity: Severity, subject: &str, body: &str) -> Result<(), String>;
}

/// No-op implementation for when notifications are not wired
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify(&self, _severity: Severity, _subject: &str, _body: &str) -> Result<(), String> {
        Ok(())
    }
}
