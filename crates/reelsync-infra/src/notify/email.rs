//! SMTP notification via lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use reelsync_core::{Config, Notifier, Severity};

use super::NotifyError;

/// Sends notifications as plain-text email to the configured report recipients.
#[derive(Clone)]
pub struct EmailNotifier {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl EmailNotifier {
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let email = &config.email;
        let host = email
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST not configured".to_string()))?;
        let from: Mailbox = email
            .smtp_from
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_FROM not configured".to_string()))?
            .parse()
            .map_err(|e| NotifyError::Config(format!("Invalid SMTP_FROM: {}", e)))?;
        let port = config.smtp_port();

        let recipients = parse_mailboxes(&email.report_recipients);
        if recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }

        let credentials = match (&email.smtp_user, &email.smtp_password) {
            (Some(u), Some(p)) => Some(Credentials::new(u.clone(), p.clone())),
            _ => None,
        };

        let mailer = if email.smtp_tls {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port);
            if let Some(credentials) = credentials {
                builder = builder.credentials(credentials);
            }
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP with STARTTLS)");
            builder.build()
        } else {
            let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            if let Some(credentials) = credentials {
                builder = builder.credentials(credentials);
            }
            tracing::info!(host = %host, port = port, "Email notifier initialized (SMTP)");
            builder.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
            from,
            recipients,
        })
    }

    fn build_message(&self, severity: Severity, subject: &str, body: &str) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(decorate_subject(severity, subject));
        for mailbox in &self.recipients {
            builder = builder.to(mailbox.clone());
        }
        builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Message(e.to_string()))
    }

    pub async fn send(&self, severity: Severity, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = self.build_message(severity, subject, body)?;
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::info!(count = self.recipients.len(), severity = %severity, "Notification email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, severity: Severity, subject: &str, body: &str) -> Result<(), String> {
        self.send(severity, subject, body).await.map_err(|e| e.to_string())
    }
}

fn decorate_subject(severity: Severity, subject: &str) -> String {
    match severity {
        Severity::Info => subject.to_string(),
        Severity::Critical => format!("[ACTION REQUIRED] {}", subject),
    }
}

fn parse_mailboxes(raw: &[String]) -> Vec<Mailbox> {
    raw.iter()
        .filter_map(|s| match s.parse::<Mailbox>() {
            Ok(mailbox) => Some(mailbox),
            Err(e) => {
                tracing::warn!(address = %s, error = %e, "Ignoring invalid report recipient");
                None
            }
        })
        .collect()
}
