use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use reelsync_auth::{
    AuthError, AuthResult, AuthorizationFlow, Authenticator, Credential, CredentialStore, TokenProvider,
};
use reelsync_core::{Notifier, Severity};

fn credential(access_token: &str, expires_in_secs: i64) -> Credential {
    Credential {
        access_token: access_token.to_string(),
        refresh_token: Some("rt".to_string()),
        token_expiry: Some(Utc::now() + Duration::seconds(expires_in_secs)),
        token_uri: "http://127.0.0.1:9/token".to_string(),
        client_id: "client".to_string(),
        client_secret: "secret".to_string(),
        scopes: vec![],
        invalid: false,
    }
}

/// Counts calls and answers with canned outcomes.
struct FakeFlow {
    authorize_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    authorize_ok: bool,
    refresh_ok: bool,
}

impl FakeFlow {
    fn new(authorize_ok: bool, refresh_ok: bool) -> Arc<Self> {
        Arc::new(Self {
            authorize_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            authorize_ok,
            refresh_ok,
        })
    }

    fn authorize_calls(&self) -> usize {
        self.authorize_calls.load(Ordering::SeqCst)
    }

    fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorizationFlow for FakeFlow {
    async fn authorize(&self) -> AuthResult<Credential> {
        self.authorize_calls.fetch_add(1, Ordering::SeqCst);
        if self.authorize_ok {
            Ok(credential("interactive", 3600))
        } else {
            Err(AuthError::ExchangeRejected("invalid_grant".to_string()))
        }
    }

    async fn refresh(&self, credential: &mut Credential) -> AuthResult<()> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.refresh_ok {
            credential.access_token = "refreshed".to_string();
            credential.token_expiry = Some(Utc::now() + Duration::seconds(3600));
            Ok(())
        } else {
            Err(AuthError::RefreshRejected("invalid_grant".to_string()))
        }
    }
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(Severity, String, String)>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, severity: Severity, subject: &str, body: &str) -> Result<(), String> {
        self.messages
            .lock()
            .unwrap()
            .push((severity, subject.to_string(), body.to_string()));
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    store: CredentialStore,
    notifier: Arc<RecordingNotifier>,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::new(dir.path().join("credentials.json"));
    Fixture {
        _dir: dir,
        store,
        notifier: Arc::new(RecordingNotifier::default()),
    }
}

fn authenticator(fx: &Fixture, flow: Arc<FakeFlow>) -> Authenticator {
    Authenticator::new(fx.store.clone(), flow, fx.notifier.clone(), 60)
}

#[tokio::test]
async fn no_stored_credential_runs_flow_once_and_persists() {
    let fx = fixture();
    let flow = FakeFlow::new(true, true);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "interactive");
    assert_eq!(flow.authorize_calls(), 1);
    assert_eq!(fx.store.load().await.unwrap().access_token, "interactive");
}

#[tokio::test]
async fn valid_stored_credential_never_runs_flow() {
    let fx = fixture();
    fx.store.save(&credential("stored", 3600)).await.unwrap();
    let flow = FakeFlow::new(true, true);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "stored");
    assert_eq!(flow.authorize_calls(), 0);
    assert_eq!(flow.refresh_calls(), 0);
}

#[tokio::test]
async fn corrupt_stored_credential_runs_flow_once() {
    let fx = fixture();
    std::fs::write(fx.store.path(), b"garbage").unwrap();
    let flow = FakeFlow::new(true, true);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "interactive");
    assert_eq!(flow.authorize_calls(), 1);
    assert_eq!(fx.store.load().await.unwrap().access_token, "interactive");
}

#[tokio::test]
async fn revoked_stored_credential_runs_flow_once() {
    let fx = fixture();
    let mut revoked = credential("stored", 3600);
    revoked.mark_invalid();
    fx.store.save(&revoked).await.unwrap();
    let flow = FakeFlow::new(true, true);

    authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(flow.authorize_calls(), 1);
    assert!(!fx.store.load().await.unwrap().invalid);
}

#[tokio::test]
async fn expired_credential_is_refreshed_and_persisted() {
    let fx = fixture();
    fx.store.save(&credential("stale", -10)).await.unwrap();
    let flow = FakeFlow::new(true, true);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "refreshed");
    assert_eq!(flow.refresh_calls(), 1);
    assert_eq!(flow.authorize_calls(), 0);
    assert_eq!(fx.store.load().await.unwrap().access_token, "refreshed");
}

#[tokio::test]
async fn credential_inside_refresh_margin_is_refreshed() {
    let fx = fixture();
    fx.store.save(&credential("almost", 30)).await.unwrap();
    let flow = FakeFlow::new(true, true);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "refreshed");
    assert_eq!(flow.refresh_calls(), 1);
}

#[tokio::test]
async fn rejected_refresh_falls_back_to_flow() {
    let fx = fixture();
    fx.store.save(&credential("stale", -10)).await.unwrap();
    let flow = FakeFlow::new(true, false);

    let credential = authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(credential.access_token, "interactive");
    assert_eq!(flow.refresh_calls(), 1);
    assert_eq!(flow.authorize_calls(), 1);
}

#[tokio::test]
async fn expired_without_refresh_token_runs_flow() {
    let fx = fixture();
    let mut stale = credential("stale", -10);
    stale.refresh_token = None;
    fx.store.save(&stale).await.unwrap();
    let flow = FakeFlow::new(true, true);

    authenticator(&fx, flow.clone()).acquire().await.unwrap();

    assert_eq!(flow.refresh_calls(), 0);
    assert_eq!(flow.authorize_calls(), 1);
}

#[tokio::test]
async fn failed_flow_sends_one_critical_notification() {
    let fx = fixture();
    let flow = FakeFlow::new(false, false);

    let err = authenticator(&fx, flow.clone()).acquire().await.unwrap_err();

    assert!(matches!(err, AuthError::ExchangeRejected(_)));
    assert!(fx.store.load().await.is_none());
    let messages = fx.notifier.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, Severity::Critical);
    assert!(messages[0].2.contains("Please re-authenticate"));
}

#[tokio::test]
async fn successful_acquire_sends_no_notification() {
    let fx = fixture();
    let flow = FakeFlow::new(true, true);

    authenticator(&fx, flow).acquire().await.unwrap();

    assert!(fx.notifier.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_hands_out_token_while_valid() {
    let fx = fixture();
    let flow = FakeFlow::new(true, true);
    let session = authenticator(&fx, flow.clone()).session(credential("fresh", 3600));

    assert_eq!(session.access_token().await.unwrap(), "fresh");
    assert_eq!(session.access_token().await.unwrap(), "fresh");
    assert_eq!(flow.refresh_calls(), 0);
}

#[tokio::test]
async fn session_refreshes_token_that_expired_mid_run() {
    let fx = fixture();
    let flow = FakeFlow::new(true, true);
    let session = authenticator(&fx, flow.clone()).session(credential("stale", 1));

    // Inside the 60s margin: refreshed before use, then reused.
    assert_eq!(session.access_token().await.unwrap(), "refreshed");
    assert_eq!(session.access_token().await.unwrap(), "refreshed");
    assert_eq!(flow.refresh_calls(), 1);
    assert_eq!(flow.authorize_calls(), 0);
    assert_eq!(fx.store.load().await.unwrap().access_token, "refreshed");
}

#[tokio::test]
async fn session_renews_after_rejection() {
    let fx = fixture();
    let flow = FakeFlow::new(true, true);
    let session = authenticator(&fx, flow.clone()).session(credential("revoked-upstream", 3600));

    assert_eq!(session.renew().await.unwrap(), "refreshed");
    assert_eq!(session.access_token().await.unwrap(), "refreshed");
    assert_eq!(flow.refresh_calls(), 1);
}

#[tokio::test]
async fn session_rejected_refresh_invalidates_without_interactive_flow() {
    let fx = fixture();
    let flow = FakeFlow::new(true, false);
    let session = authenticator(&fx, flow.clone()).session(credential("stale", -10));

    assert!(matches!(
        session.access_token().await,
        Err(AuthError::RefreshRejected(_))
    ));
    assert_eq!(flow.authorize_calls(), 0);
    assert!(fx.store.load().await.unwrap().invalid);
    assert!(session.credential().await.invalid);
}
