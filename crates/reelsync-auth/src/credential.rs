//! Delegated access credential.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::secrets::ClientSecrets;
use crate::token::TokenResponse;

/// Access/refresh token bundle issued by the authorization server.
///
/// Persisted as JSON by the [`crate::CredentialStore`]; mutated only by the
/// [`crate::Authenticator`].
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_expiry: Option<DateTime<Utc>>,
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Set once a refresh has been rejected; never cleared.
    #[serde(default)]
    pub invalid: bool,
}

impl Credential {
    pub(crate) fn from_token_response(
        response: TokenResponse,
        secrets: &ClientSecrets,
        scope: &str,
    ) -> Self {
        let mut credential = Credential {
            access_token: String::new(),
            refresh_token: None,
            token_expiry: None,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: scope.split_whitespace().map(String::from).collect(),
            invalid: false,
        };
        credential.apply(response);
        credential
    }

    /// Merge a token endpoint response. A refresh response usually omits the
    /// refresh token, in which case the existing one is kept.
    pub(crate) fn apply(&mut self, response: TokenResponse) {
        self.access_token = response.access_token;
        if let Some(refresh_token) = response.refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.token_expiry = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));
        if let Some(scope) = response.scope {
            self.scopes = scope.split_whitespace().map(String::from).collect();
        }
    }

    /// True if the access token expires within `margin_secs` (or already has).
    /// Tokens without an expiry never expire.
    pub fn expires_within_secs(&self, margin_secs: i64) -> bool {
        self.token_expiry
            .is_some_and(|expiry| Utc::now() + Duration::seconds(margin_secs) >= expiry)
    }

    pub fn is_access_token_expired(&self) -> bool {
        self.expires_within_secs(0)
    }

    pub fn can_refresh(&self) -> bool {
        !self.invalid && self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// A credential is valid when it has not been revoked locally and carries
    /// an unexpired access token.
    pub fn is_valid(&self) -> bool {
        !self.invalid && !self.access_token.is_empty() && !self.is_access_token_expired()
    }

    /// Bearer token for remote calls, only while the credential is valid.
    pub fn bearer_token(&self) -> Option<&str> {
        self.is_valid().then_some(self.access_token.as_str())
    }

    pub fn mark_invalid(&mut self) {
        self.invalid = true;
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("token_expiry", &self.token_expiry)
            .field("token_uri", &self.token_uri)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("invalid", &self.invalid)
            .finish()
    }
}
