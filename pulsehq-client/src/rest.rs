/// Profile replication over the hosted data REST API
///
/// Upserts rows into the `workspaces` and `profiles` tables under
/// `{url}/rest/v1`. Both writes use `Prefer: resolution=merge-duplicates`,
/// so replaying them for an existing user updates the row in place.

use async_trait::async_trait;
use pulsehq_shared::auth::replication::{ProfileRecord, ProfileReplicator, ReplicationError, WorkspaceRecord};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use std::time::Duration;

use crate::config::IdentityConfig;
use crate::error::{ClientError, ClientResult};

pub const WORKSPACES_TABLE: &str = "workspaces";
pub const PROFILES_TABLE: &str = "profiles";

/// `ProfileReplicator` backed by the data REST API
#[derive(Debug, Clone)]
pub struct RestReplicator {
    http: Client,
    base_url: String,
    api_key: String,
}

impl RestReplicator {
    pub fn new(config: &IdentityConfig, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(ClientError::Transport)?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &IdentityConfig) -> Self {
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn upsert_request<T: Serialize>(&self, table: &str, access_token: &str, row: &T) -> RequestBuilder {
        self.http
            .post(format!("{}/rest/v1/{}", self.base_url, table))
            .query(&[("on_conflict", "id")])
            .header("apikey", &self.api_key)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .bearer_auth(access_token)
            .json(row)
    }

    async fn upsert<T: Serialize>(&self, table: &str, access_token: &str, row: &T) -> Result<(), ReplicationError> {
        let response = self
            .upsert_request(table, access_token, row)
            .send()
            .await
            .map_err(ClientError::from)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        tracing::debug!(table, status = status.as_u16(), "Upserted row");
        Ok(())
    }
}

#[async_trait]
impl ProfileReplicator for RestReplicator {
    async fn upsert_workspace(&self, access_token: &str, workspace: &WorkspaceRecord) -> Result<(), ReplicationError> {
        self.upsert(WORKSPACES_TABLE, access_token, workspace).await
    }

    async fn upsert_profile(&self, access_token: &str, profile: &ProfileRecord) -> Result<(), ReplicationError> {
        self.upsert(PROFILES_TABLE, access_token, profile).await
    }
}
