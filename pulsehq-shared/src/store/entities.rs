/// Store bindings for the domain models
///
/// Ties each model to its collection inside [`EntityStore`] and to its patch
/// type, so the store's generic operations work for every entity kind.

use super::collection::{Collection, Entity, EntityKind, Patch};
use super::selection::{Selection, UiState};
use super::EntityStore;
use crate::models::{
    contact::{Contact, ContactPatch},
    message::{Message, MessagePatch},
    note::{Note, NotePatch},
    task::{Task, TaskPatch},
    user::{User, UserPatch},
};

mod sealed {
    pub trait Sealed {}
}

/// An entity kind owned by [`EntityStore`]
///
/// Sealed: the store knows every kind it manages.
pub trait StoredEntity: Entity + sealed::Sealed {
    #[doc(hidden)]
    fn collection(store: &EntityStore) -> &Collection<Self>;

    #[doc(hidden)]
    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self>;

    /// Keeps the inspector copy in sync after an update
    #[doc(hidden)]
    fn refresh_selection(_ui: &mut UiState, _updated: &Self) {}
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Message {
    const KIND: EntityKind = EntityKind::Message;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for Note {
    const KIND: EntityKind = EntityKind::Note;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Patch for TaskPatch {
    type Target = Task;

    fn apply_to(&self, target: &mut Task) {
        target.apply_patch(self);
    }
}

impl Patch for ContactPatch {
    type Target = Contact;

    fn apply_to(&self, target: &mut Contact) {
        target.apply_patch(self);
    }
}

impl Patch for MessagePatch {
    type Target = Message;

    fn apply_to(&self, target: &mut Message) {
        target.apply_patch(self);
    }
}

impl Patch for NotePatch {
    type Target = Note;

    fn apply_to(&self, target: &mut Note) {
        target.apply_patch(self);
    }
}

impl Patch for UserPatch {
    type Target = User;

    fn apply_to(&self, target: &mut User) {
        target.apply_patch(self);
    }
}

impl sealed::Sealed for Task {}
impl sealed::Sealed for Contact {}
impl sealed::Sealed for Message {}
impl sealed::Sealed for Note {}
impl sealed::Sealed for User {}

impl StoredEntity for Task {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.tasks
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.tasks
    }

    fn refresh_selection(ui: &mut UiState, updated: &Self) {
        if ui.is_selected(EntityKind::Task, &updated.id) {
            ui.selection = Some(Selection::Task(updated.clone()));
        }
    }
}

impl StoredEntity for Contact {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.contacts
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.contacts
    }

    fn refresh_selection(ui: &mut UiState, updated: &Self) {
        if ui.is_selected(EntityKind::Contact, &updated.id) {
            ui.selection = Some(Selection::Contact(updated.clone()));
        }
    }
}

impl StoredEntity for Message {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.messages
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.messages
    }
}

impl StoredEntity for Note {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.notes
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.notes
    }
}

impl StoredEntity for User {
    fn collection(store: &EntityStore) -> &Collection<Self> {
        &store.users
    }

    fn collection_mut(store: &mut EntityStore) -> &mut Collection<Self> {
        &mut store.users
    }
}
