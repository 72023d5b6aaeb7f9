//! Client-secret configuration artifact.

use serde::Deserialize;
use std::path::Path;

use crate::error::{AuthError, AuthResult};

/// OAuth client registration, read from the operator-provisioned JSON file.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// The file nests the registration under the application type.
#[derive(Deserialize)]
struct SecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub async fn load(path: &Path) -> AuthResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| invalid(path, e.to_string()))?;
        Self::parse(path, &raw)
    }

    pub fn parse(path: &Path, raw: &str) -> AuthResult<Self> {
        let file: SecretsFile =
            serde_json::from_str(raw).map_err(|e| invalid(path, e.to_string()))?;

        let secrets = file
            .installed
            .or(file.web)
            .ok_or_else(|| invalid(path, "expected an \"installed\" or \"web\" section"))?;

        for (field, value) in [
            ("client_id", &secrets.client_id),
            ("client_secret", &secrets.client_secret),
            ("auth_uri", &secrets.auth_uri),
            ("token_uri", &secrets.token_uri),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(path, format!("{} is empty", field)));
            }
        }

        Ok(secrets)
    }
}

fn invalid(path: &Path, reason: impl Into<String>) -> AuthError {
    AuthError::InvalidClientSecrets {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}
