/// Best-effort replication of workspace and profile records
///
/// After every sign-in the derived workspace and profile are upserted into
/// the remote data service. Replication never blocks the session and never
/// surfaces errors to the user: failures are logged and dropped, and the
/// locally derived profile stays authoritative.
///
/// The workspace is written first so the profile's foreign key resolves.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use super::profile::Profile;
use crate::models::user::UserRole;

/// Error type for replication
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationError {
    #[error("Network error: {0}")]
    Network(String),

    /// The data service rejected the write
    #[error("Data service returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Workspace row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceRecord {
    pub id: String,
    pub name: String,
    pub owner_id: String,
}

/// Profile row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub workspace_id: String,
}

impl From<&Profile> for WorkspaceRecord {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.workspace.id.clone(),
            name: profile.workspace.name.clone(),
            owner_id: profile.id.clone(),
        }
    }
}

impl From<&Profile> for ProfileRecord {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.name.clone(),
            role: profile.role,
            workspace_id: profile.workspace_id.clone(),
        }
    }
}

/// Remote data service boundary for replication
///
/// Both writes are upserts keyed by `id`.
#[async_trait]
pub trait ProfileReplicator: Send + Sync {
    async fn upsert_workspace(
        &self,
        access_token: &str,
        workspace: &WorkspaceRecord,
    ) -> Result<(), ReplicationError>;

    async fn upsert_profile(&self, access_token: &str, profile: &ProfileRecord) -> Result<(), ReplicationError>;
}

/// Runs `work` in the background, logging and discarding any error
pub fn best_effort<F>(label: &'static str, work: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), ReplicationError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = work.await {
            tracing::warn!(task = label, error = %e, "Background write failed; continuing with local state");
        }
    })
}

/// Upserts the workspace, then the profile, without blocking the caller
pub fn replicate_in_background(
    replicator: Arc<dyn ProfileReplicator>,
    access_token: String,
    profile: &Profile,
) -> JoinHandle<()> {
    let workspace = WorkspaceRecord::from(profile);
    let record = ProfileRecord::from(profile);

    best_effort("replicate_profile", async move {
        replicator.upsert_workspace(&access_token, &workspace).await?;
        replicator.upsert_profile(&access_token, &record).await?;
        tracing::debug!(user_id = %record.id, workspace_id = %workspace.id, "Replicated profile");
        Ok(())
    })
}

/// Replicator that does nothing, for running without a data service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReplicator;

#[async_trait]
impl ProfileReplicator for NoopReplicator {
    async fn upsert_workspace(&self, _: &str, _: &WorkspaceRecord) -> Result<(), ReplicationError> {
        Ok(())
    }

    async fn upsert_profile(&self, _: &str, _: &ProfileRecord) -> Result<(), ReplicationError> {
        Ok(())
    }
}

/// One write seen by [`RecordingReplicator`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicationCall {
    Workspace(WorkspaceRecord),
    Profile(ProfileRecord),
}

/// In-memory replicator that records every attempted write
///
/// With `failing()` every write is recorded and then rejected, which is how
/// tests show that replication failures don't reach the session.
#[derive(Debug, Default)]
pub struct RecordingReplicator {
    calls: Mutex<Vec<ReplicationCall>>,
    fail: bool,
    attempted: Notify,
}

impl RecordingReplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replicator whose writes all fail with a 500
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Every write attempted so far, in order
    pub fn calls(&self) -> Vec<ReplicationCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Waits until at least `count` writes were attempted
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.attempted.notified();
            if self.calls().len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, call: ReplicationCall) -> Result<(), ReplicationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        self.attempted.notify_waiters();

        if self.fail {
            return Err(ReplicationError::Rejected {
                status: 500,
                message: "replication disabled".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileReplicator for RecordingReplicator {
    async fn upsert_workspace(&self, _: &str, workspace: &WorkspaceRecord) -> Result<(), ReplicationError> {
        self.record(ReplicationCall::Workspace(workspace.clone()))
    }

    async fn upsert_profile(&self, _: &str, profile: &ProfileRecord) -> Result<(), ReplicationError> {
        self.record(ReplicationCall::Profile(profile.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::profile::WorkspaceSummary;

    fn profile() -> Profile {
        Profile {
            id: "u1".to_string(),
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            role: UserRole::Owner,
            workspace_id: "ws_1".to_string(),
            workspace: WorkspaceSummary {
                id: "ws_1".to_string(),
                name: "Alice's Workspace".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_workspace_written_before_profile() {
        let replicator = Arc::new(RecordingReplicator::new());

        replicate_in_background(replicator.clone(), "token".to_string(), &profile())
            .await
            .unwrap();

        let calls = replicator.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(&calls[0], ReplicationCall::Workspace(w) if w.owner_id == "u1" && w.id == "ws_1"));
        assert!(matches!(&calls[1], ReplicationCall::Profile(p) if p.workspace_id == "ws_1"));
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let replicator = Arc::new(RecordingReplicator::failing());

        // Join succeeds even though the write failed
        replicate_in_background(replicator.clone(), "token".to_string(), &profile())
            .await
            .unwrap();

        // Workspace failure short-circuits the profile write
        assert_eq!(replicator.calls().len(), 1);
    }

    #[test]
    fn test_profile_record_serialization() {
        let json = serde_json::to_value(ProfileRecord::from(&profile())).unwrap();
        assert_eq!(json["role"], "owner");
        assert_eq!(json["workspace_id"], "ws_1");
    }
}
