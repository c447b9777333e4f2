/// Chat message model
///
/// Messages are append-only from the chat room. The body may carry the inline
/// markup subset understood by [`crate::board::markup`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One chat message in the team channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,

    /// Author user id
    #[serde(alias = "author")]
    pub sender_id: String,

    /// Message text
    #[serde(alias = "content")]
    pub body: String,

    #[serde(default = "Utc::now", alias = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Partial update for a message
///
/// The chat view never edits messages; the patch exists so messages share the
/// store's uniform update path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessagePatch {
    pub body: Option<String>,
}

impl Message {
    pub fn new(id: impl Into<String>, sender_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }

    pub fn apply_patch(&mut self, patch: &MessagePatch) {
        if let Some(body) = &patch.body {
            self.body = body.clone();
        }
    }
}
