//! Permission sharing for a task's container.

use reelsync_core::models::PermissionGrant;
use reelsync_core::RemoteServiceError;
use reelsync_storage::{PermissionBatch, RemoteStorage};

/// A recipient whose grant was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareFailure {
    pub grantee: String,
    pub error: String,
}

/// Per-recipient outcome of sharing one container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareSummary {
    pub granted: Vec<String>,
    pub failed: Vec<ShareFailure>,
}

/// Grant every recipient read access to `container_id` in one batch.
///
/// Rejected grants are logged and collected in the summary; they never fail
/// the call. Only a failure of the round trip itself is returned as an error.
pub async fn share(
    storage: &dyn RemoteStorage,
    container_id: &str,
    recipients: &[String],
) -> Result<ShareSummary, RemoteServiceError> {
    let mut batch = PermissionBatch::new();
    for recipient in recipients {
        batch.add(PermissionGrant::reader(container_id, recipient.as_str()));
    }

    let mut summary = ShareSummary::default();
    for item in batch.submit(storage).await? {
        match item.outcome {
            Ok(permission_id) => {
                tracing::info!(
                    container_id = %container_id,
                    grantee = %item.grant.grantee_identity,
                    permission_id = %permission_id,
                    "Permission granted"
                );
                summary.granted.push(item.grant.grantee_identity);
            }
            Err(e) => {
                tracing::warn!(
                    container_id = %container_id,
                    grantee = %item.grant.grantee_identity,
                    error = %e,
                    "Permission grant failed"
                );
                summary.failed.push(ShareFailure {
                    grantee: item.grant.grantee_identity,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockRemoteStorage, RemoteCall};

    fn recipients(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn one_batch_for_all_recipients() {
        let storage = MockRemoteStorage::new();

        let summary = share(&storage, "c1", &recipients(&["a@x.org", "b@x.org"]))
            .await
            .unwrap();

        assert_eq!(summary.granted, vec!["a@x.org", "b@x.org"]);
        assert!(summary.failed.is_empty());
        assert_eq!(
            storage.calls(),
            vec![RemoteCall::Batch(recipients(&["a@x.org", "b@x.org"]))]
        );
    }

    #[tokio::test]
    async fn rejected_grant_does_not_affect_siblings() {
        let storage = MockRemoteStorage::new();
        storage.reject_grantee("b@x.org");

        let summary = share(&storage, "c1", &recipients(&["a@x.org", "b@x.org", "c@x.org"]))
            .await
            .unwrap();

        assert_eq!(summary.granted, vec!["a@x.org", "c@x.org"]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].grantee, "b@x.org");
    }

    #[tokio::test]
    async fn no_recipients_makes_no_call() {
        let storage = MockRemoteStorage::new();

        let summary = share(&storage, "c1", &[]).await.unwrap();

        assert_eq!(summary, ShareSummary::default());
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_round_trip_is_an_error() {
        let storage = MockRemoteStorage::new();
        storage.fail_batch();

        let result = share(&storage, "c1", &recipients(&["a@x.org"])).await;
        assert!(matches!(result, Err(RemoteServiceError::UnsupportedMethod(_))));
    }
}
