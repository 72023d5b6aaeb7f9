//! File-backed credential persistence.

use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::credential::Credential;
use crate::error::CredentialStoreError;

/// Persists a single [`Credential`] as JSON.
///
/// Absence or corruption of the file is not an error: [`CredentialStore::load`]
/// returns `None` and the caller re-authorizes.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Option<Credential> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No stored credential");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read stored credential");
                return None;
            }
        };

        match serde_json::from_slice::<Credential>(&raw) {
            Ok(credential) => Some(credential),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Stored credential is corrupt");
                None
            }
        }
    }

    /// Write the credential to a temporary sibling file and atomically
    /// replace the stored one.
    pub async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let data = serde_json::to_vec_pretty(credential)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &data))
            .await
            .map_err(|e| CredentialStoreError::Persist(e.to_string()))??;

        tracing::debug!(path = %self.path.display(), "Credential persisted");
        Ok(())
    }
}

fn write_atomically(path: &Path, data: &[u8]) -> Result<(), CredentialStoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| CredentialStoreError::Persist(e.error.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn credential() -> Credential {
        Credential {
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            token_expiry: None,
            token_uri: "https://oauth2.example.com/token".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec!["scope-a".to_string()],
            invalid: false,
        }
    }

    #[tokio::test]
    async fn missing_file_loads_none() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("cred.json"));
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_loads_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cred.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = CredentialStore::new(&path);
        assert!(store.load().await.is_none());
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("nested").join("cred.json"));

        store.save(&credential()).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded.access_token, "at");
        assert_eq!(loaded.refresh_token.as_deref(), Some("rt"));
        assert_eq!(loaded.scopes, vec!["scope-a"]);
    }

    #[tokio::test]
    async fn save_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cred.json");
        std::fs::write(&path, b"stale").unwrap();
        let store = CredentialStore::new(&path);

        let mut updated = credential();
        updated.access_token = "at-2".to_string();
        store.save(&updated).await.unwrap();

        assert_eq!(store.load().await.unwrap().access_token, "at-2");
        // Only the credential file remains; the temporary file was renamed over it.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
