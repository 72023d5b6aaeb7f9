//! Operator notification channels.
//!
//! Both implementations satisfy `reelsync_core::Notifier`. Email is used when
//! `EMAIL_ALERTS_ENABLED=true`; otherwise messages only go to the log.

#[cfg(feature = "email")]
mod email;
mod log;

#[cfg(feature = "email")]
pub use email::EmailNotifier;
pub use log::LogNotifier;

use reelsync_core::{Config, Notifier};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP configuration error: {0}")]
    Config(String),

    #[error("No valid recipient addresses")]
    NoRecipients,

    #[error("Failed to build message: {0}")]
    Message(String),

    #[error("SMTP delivery failed: {0}")]
    Delivery(String),
}

/// Pick the notification channel configured for this run.
pub fn notifier_from_config(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    if !config.email.enabled {
        tracing::debug!("Email alerts disabled (EMAIL_ALERTS_ENABLED=false), notifying via log");
        return Ok(Arc::new(LogNotifier));
    }

    email_notifier(config)
}

#[cfg(feature = "email")]
fn email_notifier(config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(Arc::new(EmailNotifier::from_config(config)?))
}

#[cfg(not(feature = "email"))]
fn email_notifier(_config: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    Err(anyhow::anyhow!(
        "EMAIL_ALERTS_ENABLED=true but the email feature is not enabled"
    ))
}
