use reelsync_core::{Config, Severity};
use reelsync_infra::notifier_from_config;
use std::collections::HashMap;

fn config(pairs: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.insert("LOG_CONTAINER_ID".to_string(), "log-folder".to_string());
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

#[tokio::test]
async fn disabled_email_notifies_via_log() {
    let notifier = notifier_from_config(&config(&[])).unwrap();
    assert!(notifier
        .notify(Severity::Info, "report", "line")
        .await
        .is_ok());
}

#[tokio::test]
async fn enabled_email_without_recipients_is_rejected() {
    let config = config(&[
        ("EMAIL_ALERTS_ENABLED", "true"),
        ("SMTP_HOST", "smtp.example.com"),
        ("SMTP_FROM", "reelsync@example.com"),
    ]);
    assert!(notifier_from_config(&config).is_err());
}
