/// Contact model for the CRM pipeline
///
/// Contacts sit in one of four pipeline stages and move between them by
/// drag-and-drop on the CRM board or through the contact modal.
///
/// # Pipeline Stages
///
/// ```text
/// lead → prospect → client
///                 → inactive
/// ```
///
/// The arrows show the usual flow; the board itself accepts a move between
/// any two stages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage of a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    /// New, unqualified contact
    #[default]
    Lead,

    /// Qualified, in conversation
    Prospect,

    /// Paying customer
    Client,

    /// No longer active
    Inactive,
}

impl ContactStatus {
    /// Every stage, in board order
    pub const ALL: [ContactStatus; 4] = [
        ContactStatus::Lead,
        ContactStatus::Prospect,
        ContactStatus::Client,
        ContactStatus::Inactive,
    ];

    /// Converts stage to its column id
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Lead => "lead",
            ContactStatus::Prospect => "prospect",
            ContactStatus::Client => "client",
            ContactStatus::Inactive => "inactive",
        }
    }

    /// Column heading shown on the CRM board
    pub fn title(&self) -> &'static str {
        match self {
            ContactStatus::Lead => "Leads",
            ContactStatus::Prospect => "Prospects",
            ContactStatus::Client => "Clients",
            ContactStatus::Inactive => "Inactive",
        }
    }

    /// Parses a column id; `None` for anything outside the pipeline
    pub fn from_column_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == id)
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact model representing one CRM record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Client-generated id
    pub id: String,

    /// Person or organisation name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Display name of the owning team member
    #[serde(default, alias = "assignee", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Pipeline stage
    #[serde(default)]
    pub status: ContactStatus,

    /// When the contact was created
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Partial update for a contact
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactPatch {
    pub name: Option<String>,
    pub company: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub assigned_to: Option<Option<String>>,
    pub status: Option<ContactStatus>,
}

impl ContactPatch {
    /// Patch that only moves the contact to another stage
    pub fn status(status: ContactStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Contact {
    /// Creates a lead with only a name
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            company: None,
            email: None,
            phone: None,
            website: None,
            assigned_to: None,
            status: ContactStatus::Lead,
            created_at: Utc::now(),
        }
    }

    /// Shallow-merges a patch into this contact
    pub fn apply_patch(&mut self, patch: &ContactPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(company) = &patch.company {
            self.company = company.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
        if let Some(website) = &patch.website {
            self.website = website.clone();
        }
        if let Some(assigned_to) = &patch.assigned_to {
            self.assigned_to = assigned_to.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}
