//! Delegated-authorization flow.

use async_trait::async_trait;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reelsync_core::AuthConfig;

use crate::credential::Credential;
use crate::error::{AuthError, AuthResult};
use crate::prompt::{CodePrompt, TerminalPrompt};
use crate::secrets::ClientSecrets;
use crate::token::{request_token, TokenRequestError};

/// Issues new credentials and renews existing ones.
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Run the interactive flow and return a freshly issued credential.
    async fn authorize(&self) -> AuthResult<Credential>;

    /// Exchange the credential's refresh token for a new access token in place.
    async fn refresh(&self, credential: &mut Credential) -> AuthResult<()>;
}

/// Out-of-band authorization-code flow: the operator opens a URL, grants
/// access and pastes the resulting code back.
pub struct OobFlow {
    http: Client,
    client_secrets_path: PathBuf,
    scope: String,
    redirect_uri: String,
    prompt: Arc<dyn CodePrompt>,
}

impl OobFlow {
    pub fn new(
        client_secrets_path: impl Into<PathBuf>,
        scope: impl Into<String>,
        redirect_uri: impl Into<String>,
        prompt: Arc<dyn CodePrompt>,
    ) -> AuthResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            client_secrets_path: client_secrets_path.into(),
            scope: scope.into(),
            redirect_uri: redirect_uri.into(),
            prompt,
        })
    }

    pub fn from_config(config: &AuthConfig) -> AuthResult<Self> {
        Self::new(
            config.client_secrets_path.clone(),
            config.scope.clone(),
            config.redirect_uri.clone(),
            Arc::new(TerminalPrompt),
        )
    }

    pub fn authorization_url(&self, secrets: &ClientSecrets) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope={}&response_type=code&access_type=offline",
            secrets.auth_uri,
            urlencoding::encode(&secrets.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&self.scope),
        )
    }
}

#[async_trait]
impl AuthorizationFlow for OobFlow {
    async fn authorize(&self) -> AuthResult<Credential> {
        let secrets = ClientSecrets::load(&self.client_secrets_path).await?;
        let url = self.authorization_url(&secrets);

        let code = self.prompt.read_code(&url).await?;

        let form = [
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        let response = request_token(&self.http, &secrets.token_uri, &form)
            .await
            .map_err(|e| match e {
                TokenRequestError::Rejected(msg) => AuthError::ExchangeRejected(msg),
                TokenRequestError::Transport(msg) => AuthError::Transport(msg),
            })?;

        tracing::info!("Authorization code exchanged for a new credential");
        Ok(Credential::from_token_response(response, &secrets, &self.scope))
    }

    async fn refresh(&self, credential: &mut Credential) -> AuthResult<()> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| AuthError::RefreshRejected("credential has no refresh token".to_string()))?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", credential.client_id.as_str()),
            ("client_secret", credential.client_secret.as_str()),
        ];
        let response = request_token(&self.http, &credential.token_uri, &form)
            .await
            .map_err(|e| match e {
                TokenRequestError::Rejected(msg) => AuthError::RefreshRejected(msg),
                TokenRequestError::Transport(msg) => AuthError::Transport(msg),
            })?;

        credential.apply(response);
        tracing::info!("Access token refreshed");
        Ok(())
    }
}
