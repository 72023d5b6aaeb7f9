//! Human-readable batch report.

use reelsync_core::{Notifier, Severity};

/// Ordered outcome lines of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    lines: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line; it is also written to the operational log.
    pub fn push(&mut self, line: impl Into<String>) {
        let line = line.into();
        tracing::info!(line = %line, "Report line");
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn body(&self) -> String {
        self.lines.join("\n")
    }

    /// Subject naming the host the run happened on.
    pub fn subject() -> String {
        format!("reelsync upload report from {}", host())
    }

    /// Send the report as one informational notification.
    ///
    /// Delivery failure is logged; the report content is already in the log.
    pub async fn flush(&self, notifier: &dyn Notifier) {
        if let Err(e) = notifier
            .notify(Severity::Info, &Self::subject(), &self.body())
            .await
        {
            tracing::warn!(error = %e, "Failed to deliver batch report");
        }
    }

    /// Send the lines gathered before an aborted batch stopped, with the
    /// reason, as one critical notification.
    pub async fn alert(&self, notifier: &dyn Notifier, reason: &str) {
        let subject = format!("reelsync upload batch aborted on {}", host());
        let mut body = self.body();
        if !body.is_empty() {
            body.push_str("\n\n");
        }
        body.push_str(&format!("Batch aborted: {}", reason));

        if let Err(e) = notifier.notify(Severity::Critical, &subject, &body).await {
            tracing::warn!(error = %e, "Failed to deliver aborted batch report");
        }
    }
}

fn host() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "unknown host".to_string())
}
