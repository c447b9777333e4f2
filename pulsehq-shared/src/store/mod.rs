/// Entity Store: the single authoritative in-memory state container
///
/// The store owns every domain collection (tasks, contacts, messages, notes,
/// users) and the UI selection flags. It is constructed explicitly and handed
/// to whoever needs it; there is no global instance.
///
/// # Semantics
///
/// - **Total**: no operation fails. Malformed input is accepted as-is;
///   validation belongs to [`crate::board::forms`].
/// - **Single writer**: mutations take `&mut self` and run to completion.
/// - **Snapshot replace**: each effective mutation swaps in a new collection
///   snapshot (see [`collection`]). No-ops keep the old snapshot.
/// - **Selection consistency**: updates refresh the inspector copy, deletes
///   clear a matching selection and close the inspector.
///
/// # Example
///
/// ```
/// use pulsehq_shared::models::task::{Task, TaskPatch, TaskStatus};
/// use pulsehq_shared::store::EntityStore;
///
/// let mut store = EntityStore::new();
/// store.add(Task::new("1", "Ship release"));
/// store.set_selected_task(store.get::<Task>("1").cloned());
///
/// store.update("1", TaskPatch::status(TaskStatus::Doing));
/// assert_eq!(store.selected_task().map(|t| t.status), Some(TaskStatus::Doing));
///
/// store.delete::<Task>("1");
/// assert!(store.tasks().is_empty());
/// assert!(!store.inspector_open());
/// ```

pub mod collection;
pub mod entities;
pub mod persist;
pub mod seed;
pub mod selection;

pub use collection::{Collection, Entity, EntityKind, Patch};
pub use entities::StoredEntity;
pub use persist::{FileStorage, MemoryStorage, PersistError, PersistedState, StateStorage, STORAGE_KEY};
pub use selection::{Selection, UiState, View};

use std::sync::Arc;

use crate::models::{
    contact::Contact,
    message::Message,
    note::{Note, NoteAnchor},
    task::Task,
    user::User,
};

/// In-memory container for all collections and UI state
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    tasks: Collection<Task>,
    contacts: Collection<Contact>,
    messages: Collection<Message>,
    notes: Collection<Note>,
    users: Collection<User>,
    ui: UiState,
    revision: u64,
}

/// Read-only view of the store at one revision
#[derive(Debug, Clone)]
pub struct StoreSnapshot {
    pub revision: u64,
    pub tasks: Arc<Vec<Task>>,
    pub contacts: Arc<Vec<Contact>>,
    pub messages: Arc<Vec<Message>>,
    pub notes: Arc<Vec<Note>>,
    pub users: Arc<Vec<User>>,
    pub ui: UiState,
}

impl EntityStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of effective mutations applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }

    // ------------------------------------------------------------------
    // Generic entity operations
    // ------------------------------------------------------------------

    /// Appends a record
    ///
    /// The caller supplies the id. Ids are not deduplicated: a colliding id
    /// is logged and the record is appended anyway, and lookups keep
    /// returning the earlier record.
    pub fn add<T: StoredEntity>(&mut self, item: T) {
        if T::collection(self).contains(item.id()) {
            tracing::warn!(kind = %T::KIND, id = item.id(), "Adding entity with an id already in use");
        }
        tracing::debug!(kind = %T::KIND, id = item.id(), "Entity added");
        T::collection_mut(self).push(item);
        self.bump();
    }

    /// Shallow-merges `patch` into the record with `id`
    ///
    /// Returns `false` and changes nothing when no record has that id.
    pub fn update<P>(&mut self, id: &str, patch: P) -> bool
    where
        P: Patch,
        P::Target: StoredEntity,
    {
        let kind = <P::Target as Entity>::KIND;
        let Some(updated) = <P::Target as StoredEntity>::collection_mut(self).update(id, &patch) else {
            tracing::debug!(%kind, id, "Update ignored: no such entity");
            return false;
        };

        <P::Target as StoredEntity>::refresh_selection(&mut self.ui, &updated);
        tracing::debug!(%kind, id, ?patch, "Entity updated");
        self.bump();
        true
    }

    /// Removes the record with `id`
    ///
    /// Clears the selection and closes the inspector if that record was
    /// selected. Returns `false` when no record has that id.
    pub fn delete<T: StoredEntity>(&mut self, id: &str) -> bool {
        let removed = T::collection_mut(self).remove(id);
        if removed == 0 {
            tracing::debug!(kind = %T::KIND, id, "Delete ignored: no such entity");
            return false;
        }

        if self.ui.clear_if_selected(T::KIND, id) {
            tracing::debug!(kind = %T::KIND, id, "Deleted entity was selected; inspector closed");
        }
        tracing::debug!(kind = %T::KIND, id, removed, "Entity deleted");
        self.bump();
        true
    }

    /// Looks up a record by id
    pub fn get<T: StoredEntity>(&self, id: &str) -> Option<&T> {
        T::collection(self).get(id)
    }

    /// Current snapshot of one collection
    pub fn all<T: StoredEntity>(&self) -> Arc<Vec<T>> {
        T::collection(self).snapshot()
    }

    pub fn collection<T: StoredEntity>(&self) -> &Collection<T> {
        T::collection(self)
    }

    pub fn tasks(&self) -> &Collection<Task> {
        &self.tasks
    }

    pub fn contacts(&self) -> &Collection<Contact> {
        &self.contacts
    }

    pub fn messages(&self) -> &Collection<Message> {
        &self.messages
    }

    pub fn notes(&self) -> &Collection<Note> {
        &self.notes
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    /// Notes attached to one contact or task, oldest first
    pub fn notes_for(&self, anchor: &NoteAnchor) -> Vec<Note> {
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| &note.anchor == anchor)
            .cloned()
            .collect();
        notes.sort_by_key(|note| note.created_at);
        notes
    }

    /// Replaces the whole team member list
    pub fn replace_users(&mut self, users: Vec<User>) {
        self.users.replace_all(users);
        self.bump();
    }

    // ------------------------------------------------------------------
    // Selection and layout
    // ------------------------------------------------------------------

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.ui.selected_task()
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.ui.selected_contact()
    }

    pub fn inspector_open(&self) -> bool {
        self.ui.inspector_open()
    }

    /// Selects a task (clearing any selected contact)
    ///
    /// The inspector opens iff `task` is `Some`.
    pub fn set_selected_task(&mut self, task: Option<Task>) {
        self.ui.select(task.map(Selection::Task));
        self.bump();
    }

    /// Selects a contact (clearing any selected task)
    ///
    /// The inspector opens iff `contact` is `Some`.
    pub fn set_selected_contact(&mut self, contact: Option<Contact>) {
        self.ui.select(contact.map(Selection::Contact));
        self.bump();
    }

    /// Selects the task with `id`; returns `false` if it does not exist
    pub fn select_task(&mut self, id: &str) -> bool {
        let Some(task) = self.tasks.get(id).cloned() else {
            return false;
        };
        self.set_selected_task(Some(task));
        true
    }

    /// Selects the contact with `id`; returns `false` if it does not exist
    pub fn select_contact(&mut self, id: &str) -> bool {
        let Some(contact) = self.contacts.get(id).cloned() else {
            return false;
        };
        self.set_selected_contact(Some(contact));
        true
    }

    /// Forces the inspector closed, keeping the selection
    pub fn close_inspector(&mut self) {
        if self.ui.inspector_open {
            self.ui.inspector_open = false;
            self.bump();
        }
    }

    /// Reopens the inspector; no-op without a selection
    pub fn open_inspector(&mut self) {
        if self.ui.selection.is_some() && !self.ui.inspector_open {
            self.ui.inspector_open = true;
            self.bump();
        }
    }

    pub fn set_sidebar_open(&mut self, open: bool) {
        self.ui.sidebar_open = open;
        self.bump();
    }

    pub fn toggle_sidebar(&mut self) {
        self.set_sidebar_open(!self.ui.sidebar_open);
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.ui.search_query = query.into();
        self.bump();
    }

    pub fn set_current_view(&mut self, view: View) {
        self.ui.current_view = view;
        self.bump();
    }

    /// Takes a consistent read-only snapshot of everything
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            revision: self.revision,
            tasks: self.tasks.snapshot(),
            contacts: self.contacts.snapshot(),
            messages: self.messages.snapshot(),
            notes: self.notes.snapshot(),
            users: self.users.snapshot(),
            ui: self.ui.clone(),
        }
    }
}
