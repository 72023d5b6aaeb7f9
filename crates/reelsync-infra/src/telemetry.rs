//! Tracing initialization
//!
//! Events go to stderr and are appended to the live log file. The file is
//! opened in append mode so that when the log rotator truncates it, later
//! writes start again at offset zero.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "reelsync=debug,info";

/// Initialize tracing with a console layer and a file layer writing to `log_file`.
pub fn init_telemetry(log_file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = log_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()?;

    tracing::debug!(log_file = %log_file.display(), "Tracing initialized");
    Ok(())
}
