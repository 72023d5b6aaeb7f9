//! Access tokens for the duration of a batch run.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::flow::AuthorizationFlow;
use crate::store::CredentialStore;

/// Supplies the bearer token attached to each remote call.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// A token that is valid now.
    async fn access_token(&self) -> AuthResult<String>;

    /// Called after the service rejected the last token.
    async fn renew(&self) -> AuthResult<String>;
}

/// Fixed token, never renewed.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> AuthResult<String> {
        Ok(self.0.clone())
    }

    async fn renew(&self) -> AuthResult<String> {
        Err(AuthError::RefreshRejected("static token cannot be renewed".to_string()))
    }
}

/// A credential kept valid across a run by refreshing it in place.
///
/// Every refresh is persisted. A rejected refresh marks the credential
/// invalid; the interactive flow is never started from here, since no
/// operator is expected mid-run.
pub struct CredentialSession {
    credential: Mutex<Credential>,
    flow: Arc<dyn AuthorizationFlow>,
    store: CredentialStore,
    refresh_margin_secs: i64,
}

impl CredentialSession {
    pub fn new(
        credential: Credential,
        flow: Arc<dyn AuthorizationFlow>,
        store: CredentialStore,
        refresh_margin_secs: i64,
    ) -> Self {
        Self {
            credential: Mutex::new(credential),
            flow,
            store,
            refresh_margin_secs,
        }
    }

    pub async fn credential(&self) -> Credential {
        self.credential.lock().await.clone()
    }

    async fn refresh(&self, credential: &mut Credential) -> AuthResult<String> {
        if !credential.can_refresh() {
            return Err(AuthError::RefreshRejected(
                "credential expired and cannot be refreshed".to_string(),
            ));
        }

        match self.flow.refresh(credential).await {
            Ok(()) => {
                self.store.save(credential).await?;
                credential.bearer_token().map(String::from).ok_or_else(|| {
                    AuthError::RefreshRejected("refresh returned an unusable credential".to_string())
                })
            }
            Err(AuthError::RefreshRejected(reason)) => {
                tracing::warn!(reason = %reason, "Refresh rejected mid-run; credential marked invalid");
                credential.mark_invalid();
                self.store.save(credential).await?;
                Err(AuthError::RefreshRejected(reason))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl TokenProvider for CredentialSession {
    async fn access_token(&self) -> AuthResult<String> {
        let mut credential = self.credential.lock().await;
        if credential.is_valid() && !credential.expires_within_secs(self.refresh_margin_secs) {
            return Ok(credential.access_token.clone());
        }
        tracing::debug!("Access token about to expire, refreshing");
        self.refresh(&mut credential).await
    }

    async fn renew(&self) -> AuthResult<String> {
        let mut credential = self.credential.lock().await;
        tracing::info!("Access token rejected by the service, refreshing");
        self.refresh(&mut credential).await
    }
}
