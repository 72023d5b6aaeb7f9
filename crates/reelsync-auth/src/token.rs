use reqwest::Client;
use serde::Deserialize;

/// Token endpoint response (authorization-code exchange or refresh).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub scope: Option<String>,
}

/// Why a token request did not produce a token.
#[derive(Debug)]
pub(crate) enum TokenRequestError {
    /// The server answered with a non-success status or an unusable body.
    Rejected(String),
    Transport(String),
}

pub(crate) async fn request_token(
    http: &Client,
    token_uri: &str,
    form: &[(&str, &str)],
) -> Result<TokenResponse, TokenRequestError> {
    let response = http
        .post(token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| TokenRequestError::Transport(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(TokenRequestError::Rejected(format!(
            "status {}: {}",
            status, body
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| TokenRequestError::Rejected(format!("unreadable token response: {}", e)))
}
