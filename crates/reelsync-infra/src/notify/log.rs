use async_trait::async_trait;
use reelsync_core::{Notifier, Severity};

/// Writes notifications to the tracing log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, severity: Severity, subject: &str, body: &str) -> Result<(), String> {
        match severity {
            Severity::Info => tracing::info!(subject = %subject, "{}", body),
            Severity::Critical => tracing::error!(subject = %subject, "{}", body),
        }
        Ok(())
    }
}
