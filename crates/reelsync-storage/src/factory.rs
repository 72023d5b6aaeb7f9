#[cfg(feature = "storage-drive")]
use crate::DriveStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{RemoteStorage, StorageBackend, StorageError, StorageResult};
use reelsync_auth::TokenProvider;
use reelsync_core::Config;
use std::sync::Arc;

/// Create a remote storage backend based on configuration
///
/// The Drive backend needs a token source that can produce a valid token
/// now; an absent or exhausted one is refused so it can never reach a
/// remote call. The local backend works offline and ignores it.
pub async fn create_storage(
    config: &Config,
    tokens: Option<Arc<dyn TokenProvider>>,
) -> StorageResult<Arc<dyn RemoteStorage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-drive")]
        StorageBackend::Drive => {
            let tokens = tokens.ok_or_else(|| {
                StorageError::InvalidCredential("Drive backend requires a credential".to_string())
            })?;
            tokens
                .access_token()
                .await
                .map_err(|e| StorageError::InvalidCredential(e.to_string()))?;

            let storage = DriveStorage::new(&config.drive, tokens)?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-drive"))]
        StorageBackend::Drive => Err(StorageError::ConfigError(
            "Drive storage backend not available (storage-drive feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
