//! Batched permission submission.

use reelsync_core::models::PermissionGrant;
use reelsync_core::RemoteServiceError;

use crate::traits::RemoteStorage;

/// Outcome of one sub-request of a submitted batch.
#[derive(Debug)]
pub struct BatchItemResult {
    pub grant: PermissionGrant,
    /// Permission id on success.
    pub outcome: Result<String, RemoteServiceError>,
}

impl BatchItemResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Permission grants accumulated for a single round trip.
///
/// A batch is created, filled and submitted once; `submit` consumes it so
/// grants can never leak into a later submission.
#[derive(Debug, Default)]
pub struct PermissionBatch {
    grants: Vec<PermissionGrant>,
}

impl PermissionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, grant: PermissionGrant) {
        self.grants.push(grant);
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Send every grant in one round trip and pair each with its outcome.
    ///
    /// An empty batch returns immediately without a remote call.
    pub async fn submit(
        self,
        storage: &dyn RemoteStorage,
    ) -> Result<Vec<BatchItemResult>, RemoteServiceError> {
        if self.grants.is_empty() {
            return Ok(Vec::new());
        }

        let outcomes = storage.execute_batch(&self.grants).await?;
        if outcomes.len() != self.grants.len() {
            return Err(RemoteServiceError::MalformedResponse(format!(
                "batch returned {} results for {} requests",
                outcomes.len(),
                self.grants.len()
            )));
        }

        Ok(self
            .grants
            .into_iter()
            .zip(outcomes)
            .map(|(grant, outcome)| BatchItemResult { grant, outcome })
            .collect())
    }
}
