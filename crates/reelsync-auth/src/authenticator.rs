use std::sync::Arc;

use reelsync_core::{AuthConfig, Notifier, Severity};

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::flow::{AuthorizationFlow, OobFlow};
use crate::session::CredentialSession;
use crate::store::CredentialStore;

/// Produces a credential that is valid when returned.
///
/// Order of preference: the stored credential as-is, the stored credential
/// after a refresh, a credential from the interactive flow. The result is
/// persisted before it is handed out. If no credential can be produced the
/// operator is notified with [`Severity::Critical`].
pub struct Authenticator {
    store: CredentialStore,
    flow: Arc<dyn AuthorizationFlow>,
    notifier: Arc<dyn Notifier>,
    refresh_margin_secs: i64,
}

impl Authenticator {
    pub fn new(
        store: CredentialStore,
        flow: Arc<dyn AuthorizationFlow>,
        notifier: Arc<dyn Notifier>,
        refresh_margin_secs: i64,
    ) -> Self {
        Self {
            store,
            flow,
            notifier,
            refresh_margin_secs,
        }
    }

    pub fn from_config(config: &AuthConfig, notifier: Arc<dyn Notifier>) -> AuthResult<Self> {
        let flow = OobFlow::from_config(config)?;
        Ok(Self::new(
            CredentialStore::new(config.credential_path.clone()),
            Arc::new(flow),
            notifier,
            config.token_refresh_margin_secs,
        ))
    }

    /// Wrap an acquired credential so it is refreshed for as long as a run lasts.
    pub fn session(&self, credential: Credential) -> CredentialSession {
        CredentialSession::new(
            credential,
            self.flow.clone(),
            self.store.clone(),
            self.refresh_margin_secs,
        )
    }

    pub async fn acquire(&self) -> AuthResult<Credential> {
        match self.try_acquire().await {
            Ok(credential) => Ok(credential),
            Err(e) => {
                tracing::error!(error = %e, "Authentication failed");
                let body = format!(
                    "Please re-authenticate reelsync, authentication attempt failed with error\n{}\n",
                    e
                );
                if let Err(notify_err) = self
                    .notifier
                    .notify(Severity::Critical, "reelsync authentication failed", &body)
                    .await
                {
                    tracing::warn!(error = %notify_err, "Failed to send authentication alert");
                }
                Err(e)
            }
        }
    }

    async fn try_acquire(&self) -> AuthResult<Credential> {
        let stored = match self.store.load().await {
            Some(credential) => self.revalidate(credential).await?,
            None => None,
        };

        let credential = match stored {
            Some(credential) => credential,
            None => {
                tracing::info!("Starting interactive authorization");
                let credential = self.flow.authorize().await?;
                if !credential.is_valid() {
                    return Err(AuthError::ExchangeRejected(
                        "issued credential is not valid".to_string(),
                    ));
                }
                credential
            }
        };

        self.store.save(&credential).await?;
        Ok(credential)
    }

    /// Returns the stored credential if it can be used, refreshing it when it
    /// is about to expire. `None` means interactive authorization is needed.
    async fn revalidate(&self, mut credential: Credential) -> AuthResult<Option<Credential>> {
        if credential.invalid {
            tracing::info!("Stored credential was revoked locally");
            return Ok(None);
        }

        if credential.is_valid() && !credential.expires_within_secs(self.refresh_margin_secs) {
            tracing::debug!("Stored credential is valid");
            return Ok(Some(credential));
        }

        if !credential.can_refresh() {
            tracing::info!("Stored credential expired and cannot be refreshed");
            return Ok(None);
        }

        match self.flow.refresh(&mut credential).await {
            Ok(()) if credential.is_valid() => Ok(Some(credential)),
            Ok(()) => {
                tracing::warn!("Refresh returned an unusable credential");
                Ok(None)
            }
            Err(AuthError::RefreshRejected(reason)) => {
                tracing::warn!(reason = %reason, "Refresh rejected; credential marked invalid");
                credential.mark_invalid();
                self.store.save(&credential).await?;
                Ok(None)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Refresh failed");
                Ok(None)
            }
        }
    }
}
