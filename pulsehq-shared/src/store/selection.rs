/// UI selection and layout state owned by the store
///
/// At most one of the selected task / selected contact exists at a time. The
/// selection is a single `Option<Selection>`, so setting one side always
/// replaces the other.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::collection::EntityKind;
use crate::models::{contact::Contact, task::Task};

/// Top-level view of the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Kanban board
    #[default]
    Tasks,

    /// Contact pipeline
    Crm,

    /// Team chat
    Chat,

    /// Team members
    Team,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Tasks => "tasks",
            View::Crm => "crm",
            View::Chat => "chat",
            View::Team => "team",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record shown in the inspector panel
///
/// Holds a copy of the record; the store refreshes it whenever the underlying
/// record is updated.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Task(Task),
    Contact(Contact),
}

impl Selection {
    /// Id of the selected record
    pub fn id(&self) -> &str {
        match self {
            Selection::Task(task) => &task.id,
            Selection::Contact(contact) => &contact.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Selection::Task(_) => EntityKind::Task,
            Selection::Contact(_) => EntityKind::Contact,
        }
    }

    fn is(&self, kind: EntityKind, id: &str) -> bool {
        self.kind() == kind && self.id() == id
    }
}

/// Cross-cutting UI flags
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub(crate) selection: Option<Selection>,
    pub(crate) inspector_open: bool,
    pub(crate) sidebar_open: bool,
    pub(crate) search_query: String,
    pub(crate) current_view: View,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            selection: None,
            inspector_open: false,
            sidebar_open: true,
            search_query: String::new(),
            current_view: View::Tasks,
        }
    }
}

impl UiState {
    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_task(&self) -> Option<&Task> {
        match &self.selection {
            Some(Selection::Task(task)) => Some(task),
            _ => None,
        }
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        match &self.selection {
            Some(Selection::Contact(contact)) => Some(contact),
            _ => None,
        }
    }

    pub fn inspector_open(&self) -> bool {
        self.inspector_open
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar_open
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn current_view(&self) -> View {
        self.current_view
    }

    /// Replaces the selection and syncs the inspector with it
    pub(crate) fn select(&mut self, selection: Option<Selection>) {
        self.inspector_open = selection.is_some();
        self.selection = selection;
    }

    /// Whether the selection is the `kind` record with `id`
    pub fn is_selected(&self, kind: EntityKind, id: &str) -> bool {
        self.selection.as_ref().is_some_and(|s| s.is(kind, id))
    }

    /// Clears the selection if it is the `kind` record with `id`
    pub(crate) fn clear_if_selected(&mut self, kind: EntityKind, id: &str) -> bool {
        if self.is_selected(kind, id) {
            self.select(None);
            return true;
        }
        false
    }
}
