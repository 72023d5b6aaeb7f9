use async_trait::async_trait;
use reelsync_core::{Notifier, Severity};
use std::sync::{Arc, Mutex};

/// Notifier that keeps every message for assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<(Severity, String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<(Severity, String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, severity: Severity, subject: &str, body: &str) -> Result<(), String> {
        self.messages
            .lock()
            .unwrap()
            .push((severity, subject.to_string(), body.to_string()));
        Ok(())
    }
}
