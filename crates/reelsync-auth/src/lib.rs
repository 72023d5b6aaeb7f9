//! Delegated-access authentication for reelsync.
//!
//! The [`Authenticator`] produces a credential that is valid at the time it is
//! returned: it loads the one persisted by the [`CredentialStore`], refreshes
//! it when the access token has expired, and otherwise falls back to the
//! interactive out-of-band authorization flow. Whatever it returns has already
//! been written back to the store.
//!
//! During a run, [`CredentialSession`] keeps that credential fresh for the
//! remote client.

pub mod authenticator;
pub mod credential;
pub mod error;
pub mod flow;
pub mod prompt;
pub mod secrets;
pub mod session;
pub mod store;
mod token;

pub use authenticator::Authenticator;
pub use credential::Credential;
pub use error::{AuthError, AuthResult, CredentialStoreError};
pub use flow::{AuthorizationFlow, OobFlow};
pub use prompt::{CodePrompt, TerminalPrompt, AUTH_CODE_ENV_VAR};
pub use secrets::ClientSecrets;
pub use session::{CredentialSession, StaticToken, TokenProvider};
pub use store::CredentialStore;
