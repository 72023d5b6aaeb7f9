//! Authorization-code acquisition via environment variable or terminal.

use async_trait::async_trait;
use std::io::{BufRead, IsTerminal, Write};

use crate::error::{AuthError, AuthResult};

/// Environment variable consulted before prompting, for headless runs.
pub const AUTH_CODE_ENV_VAR: &str = "REELSYNC_AUTH_CODE";

/// Presents the authorization URL to an operator and returns the code they obtained.
#[async_trait]
pub trait CodePrompt: Send + Sync {
    async fn read_code(&self, authorization_url: &str) -> AuthResult<String>;
}

/// Reads the code from `REELSYNC_AUTH_CODE`, falling back to stdin when it is a terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

#[async_trait]
impl CodePrompt for TerminalPrompt {
    async fn read_code(&self, authorization_url: &str) -> AuthResult<String> {
        if let Some(code) = non_empty(std::env::var(AUTH_CODE_ENV_VAR).ok()) {
            tracing::info!("Using authorization code from {}", AUTH_CODE_ENV_VAR);
            return Ok(code);
        }

        if !std::io::stdin().is_terminal() {
            return Err(AuthError::CodeUnavailable(format!(
                "stdin is not a terminal; set {} or run interactively",
                AUTH_CODE_ENV_VAR
            )));
        }

        let url = authorization_url.to_string();
        let line = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
            let mut stderr = std::io::stderr();
            writeln!(stderr, "Go to the following link in your browser:\n\n    {}\n", url)?;
            write!(stderr, "Enter verification code: ")?;
            stderr.flush()?;

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            Ok(line)
        })
        .await
        .map_err(|e| AuthError::CodeUnavailable(e.to_string()))?
        .map_err(|e| AuthError::CodeUnavailable(format!("failed to read code: {}", e)))?;

        non_empty(Some(line))
            .ok_or_else(|| AuthError::CodeUnavailable("empty authorization code".to_string()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_ignored() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   \n".to_string())), None);
        assert_eq!(non_empty(Some(" 4/abc\n".to_string())), Some("4/abc".to_string()));
    }
}
