//! Configuration module
//!
//! Every destination the pipeline talks to (remote endpoints, the log
//! container, credential and client-secret files, the live log file, the task
//! database) is a configuration value read from the environment, so a test
//! run can point each component at fakes.

use std::env;
use std::path::PathBuf;

use crate::storage_types::StorageBackend;

// Common constants
const DEFAULT_STATE_DIR: &str = ".reelsync";
const DRIVE_API_BASE_URL: &str = "https://www.googleapis.com";
const DRIVE_CHUNK_SIZE_BYTES: usize = 8 * 1024 * 1024;
const DRIVE_CHUNK_ALIGNMENT: usize = 256 * 1024;
const DRIVE_MAX_RESUME_ATTEMPTS: u32 = 5;
const HTTP_TIMEOUT_SECS: u64 = 300;
const OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/drive";
const OAUTH_OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;
const EXCLUDED_FILE_NAMES: &str = "ffmpeg2pass-0.log.mbtree";
const SMTP_PORT: u16 = 587;

/// Drive-compatible remote endpoint settings
#[derive(Clone, Debug)]
pub struct DriveConfig {
    pub api_base_url: String,
    pub upload_base_url: String,
    /// Optional parent under which task containers are created.
    pub parent_folder_id: Option<String>,
    pub chunk_size_bytes: usize,
    pub max_resume_attempts: u32,
    pub http_timeout_secs: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base_url: DRIVE_API_BASE_URL.to_string(),
            upload_base_url: DRIVE_API_BASE_URL.to_string(),
            parent_folder_id: None,
            chunk_size_bytes: DRIVE_CHUNK_SIZE_BYTES,
            max_resume_attempts: DRIVE_MAX_RESUME_ATTEMPTS,
            http_timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

/// Delegated-authorization settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub credential_path: PathBuf,
    pub client_secrets_path: PathBuf,
    pub scope: String,
    pub redirect_uri: String,
    /// Access tokens expiring within this many seconds are refreshed up front.
    pub token_refresh_margin_secs: i64,
}

#[derive(Clone, Debug)]
pub struct LogConfig {
    pub file_path: PathBuf,
    /// Well-known remote container receiving rotated log snapshots.
    pub container_id: String,
}

/// Email / alert notifications
#[derive(Clone, Debug, Default)]
pub struct EmailConfig {
    pub enabled: bool,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    pub report_recipients: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub drive: DriveConfig,
    pub local_storage_path: Option<PathBuf>,
    pub auth: AuthConfig,
    pub log: LogConfig,
    pub email: EmailConfig,
    /// Transient build artifacts never uploaded (e.g. encoder side-car files).
    pub excluded_file_names: Vec<String>,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let state_dir = PathBuf::from(var("REELSYNC_HOME").unwrap_or_else(|| DEFAULT_STATE_DIR.into()));

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse()?,
            None => StorageBackend::Drive,
        };

        let api_base_url = var("DRIVE_API_BASE_URL").unwrap_or_else(|| DRIVE_API_BASE_URL.into());
        let drive = DriveConfig {
            upload_base_url: var("DRIVE_UPLOAD_BASE_URL").unwrap_or_else(|| api_base_url.clone()),
            api_base_url,
            parent_folder_id: var("DRIVE_PARENT_FOLDER_ID"),
            chunk_size_bytes: parse_or(&var, "DRIVE_CHUNK_SIZE_BYTES", DRIVE_CHUNK_SIZE_BYTES)?,
            max_resume_attempts: parse_or(&var, "DRIVE_MAX_RESUME_ATTEMPTS", DRIVE_MAX_RESUME_ATTEMPTS)?,
            http_timeout_secs: parse_or(&var, "HTTP_TIMEOUT_SECS", HTTP_TIMEOUT_SECS)?,
        };

        let auth = AuthConfig {
            credential_path: var("CREDENTIAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("credentials.json")),
            client_secrets_path: var("CLIENT_SECRETS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("client_secrets.json")),
            scope: var("OAUTH_SCOPE").unwrap_or_else(|| OAUTH_SCOPE.into()),
            redirect_uri: var("OAUTH_REDIRECT_URI").unwrap_or_else(|| OAUTH_OOB_REDIRECT_URI.into()),
            token_refresh_margin_secs: parse_or(&var, "TOKEN_REFRESH_MARGIN_SECS", TOKEN_REFRESH_MARGIN_SECS)?,
        };

        let log = LogConfig {
            file_path: var("LOG_FILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| state_dir.join("logs").join("reelsync.log")),
            container_id: var("LOG_CONTAINER_ID").unwrap_or_default(),
        };

        let email = EmailConfig {
            enabled: parse_or(&var, "EMAIL_ALERTS_ENABLED", false)?,
            smtp_host: var("SMTP_HOST"),
            smtp_port: var("SMTP_PORT").and_then(|p| p.parse().ok()),
            smtp_user: var("SMTP_USER"),
            smtp_password: var("SMTP_PASSWORD"),
            smtp_from: var("SMTP_FROM"),
            smtp_tls: parse_or(&var, "SMTP_TLS", true)?,
            report_recipients: split_list(var("REPORT_RECIPIENTS").as_deref().unwrap_or("")),
        };

        let config = Config {
            database_url: var("DATABASE_URL").unwrap_or_else(|| {
                format!("sqlite://{}?mode=rwc", state_dir.join("tasks.db").display())
            }),
            environment,
            storage_backend,
            drive,
            local_storage_path: var("LOCAL_STORAGE_PATH").map(PathBuf::from),
            auth,
            log,
            email,
            excluded_file_names: split_list(
                var("EXCLUDED_FILE_NAMES").as_deref().unwrap_or(EXCLUDED_FILE_NAMES),
            ),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.log.container_id.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "LOG_CONTAINER_ID must be set to the remote container receiving log snapshots"
            ));
        }

        if self.storage_backend == StorageBackend::Local && self.local_storage_path.is_none() {
            return Err(anyhow::anyhow!(
                "LOCAL_STORAGE_PATH must be set when STORAGE_BACKEND=local"
            ));
        }

        if self.drive.chunk_size_bytes == 0 || self.drive.chunk_size_bytes % DRIVE_CHUNK_ALIGNMENT != 0 {
            return Err(anyhow::anyhow!(
                "DRIVE_CHUNK_SIZE_BYTES must be a non-zero multiple of {} bytes",
                DRIVE_CHUNK_ALIGNMENT
            ));
        }

        if self.email.enabled && (self.email.smtp_host.is_none() || self.email.smtp_from.is_none()) {
            return Err(anyhow::anyhow!(
                "SMTP_HOST and SMTP_FROM must be set when EMAIL_ALERTS_ENABLED=true"
            ));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn smtp_port(&self) -> u16 {
        self.email.smtp_port.unwrap_or(SMTP_PORT)
    }

    /// True when `file_name` is a transient artifact that must not be uploaded.
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.excluded_file_names.iter().any(|n| n == file_name)
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .to_lowercase()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_applied() {
        let config = Config::from_lookup(lookup(&[("LOG_CONTAINER_ID", "logs-123")])).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Drive);
        assert_eq!(config.drive.api_base_url, DRIVE_API_BASE_URL);
        assert_eq!(config.drive.upload_base_url, DRIVE_API_BASE_URL);
        assert_eq!(config.auth.redirect_uri, OAUTH_OOB_REDIRECT_URI);
        assert_eq!(config.excluded_file_names, vec!["ffmpeg2pass-0.log.mbtree"]);
        assert!(config.is_excluded("ffmpeg2pass-0.log.mbtree"));
        assert!(!config.is_excluded("video.mp4"));
        assert!(config.database_url.starts_with("sqlite://"));
        assert_eq!(config.smtp_port(), SMTP_PORT);
        assert!(!config.is_production());
    }

    #[test]
    fn log_container_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("LOG_CONTAINER_ID"));
    }

    #[test]
    fn local_backend_requires_path() {
        let err = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("STORAGE_BACKEND", "local"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));

        let config = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/tmp/remote"),
        ]))
        .unwrap();
        assert_eq!(config.local_storage_path, Some(PathBuf::from("/tmp/remote")));
    }

    #[test]
    fn chunk_size_must_be_aligned() {
        let err = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("DRIVE_CHUNK_SIZE_BYTES", "1000"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DRIVE_CHUNK_SIZE_BYTES"));
    }

    #[test]
    fn explicit_paths_override_state_dir() {
        let config = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("REELSYNC_HOME", "/var/lib/reelsync"),
            ("CREDENTIAL_PATH", "/etc/reelsync/cred.json"),
            ("EXCLUDED_FILE_NAMES", "a.tmp, b.tmp"),
        ]))
        .unwrap();
        assert_eq!(config.auth.credential_path, PathBuf::from("/etc/reelsync/cred.json"));
        assert_eq!(
            config.auth.client_secrets_path,
            PathBuf::from("/var/lib/reelsync/client_secrets.json")
        );
        assert_eq!(
            config.log.file_path,
            PathBuf::from("/var/lib/reelsync/logs/reelsync.log")
        );
        assert_eq!(config.excluded_file_names, vec!["a.tmp", "b.tmp"]);
    }

    #[test]
    fn email_enabled_requires_smtp() {
        let err = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("EMAIL_ALERTS_ENABLED", "true"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("SMTP_HOST"));

        let config = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("EMAIL_ALERTS_ENABLED", "TRUE"),
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_FROM", "reelsync@example.com"),
            ("REPORT_RECIPIENTS", "ops@example.com, lead@example.com"),
        ]))
        .unwrap();
        assert!(config.email.enabled);
        assert_eq!(config.email.report_recipients.len(), 2);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("LOG_CONTAINER_ID", "logs"),
            ("DRIVE_MAX_RESUME_ATTEMPTS", "many"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DRIVE_MAX_RESUME_ATTEMPTS"));
    }
}
