/// Timeline note model
///
/// A note is a history entry attached to exactly one contact or exactly one
/// task. The attachment is the [`NoteAnchor`] enum, flattened on the wire to
/// either a `contact_id` or a `task_id` key:
///
/// ```json
/// { "id": "1718000000001", "contact_id": "2", "author_id": "u1", "body": "Called back" }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a note is attached to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteAnchor {
    #[serde(rename = "contact_id")]
    Contact(String),

    #[serde(rename = "task_id")]
    Task(String),
}

impl NoteAnchor {
    /// Id of the anchored entity
    pub fn entity_id(&self) -> &str {
        match self {
            NoteAnchor::Contact(id) | NoteAnchor::Task(id) => id,
        }
    }
}

/// Timeline entry on a contact or task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,

    #[serde(flatten)]
    pub anchor: NoteAnchor,

    pub author_id: String,

    pub body: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Set when the body was edited in place
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Partial update for a note (edit-in-place)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotePatch {
    pub body: Option<String>,
}

impl Note {
    pub fn new(
        id: impl Into<String>,
        anchor: NoteAnchor,
        author_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            anchor,
            author_id: author_id.into(),
            body: body.into(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn apply_patch(&mut self, patch: &NotePatch) {
        if let Some(body) = &patch.body {
            self.body = body.clone();
            self.updated_at = Some(Utc::now());
        }
    }
}
