/// Chat and note timelines
///
/// Chat messages and inspector notes render the same way: entries are shown
/// in order and consecutive entries from one author are grouped under a
/// single avatar. A new group starts when the author changes or when more
/// than [`GROUP_GAP_MINUTES`] passed since the previous entry.

use chrono::{DateTime, Duration, Utc};

use super::forms::{BodyForm, FormError};
use crate::models::{
    generate_id,
    message::Message,
    note::{Note, NoteAnchor, NotePatch},
};
use crate::store::{EntityKind, EntityStore};

/// Longest pause that still continues an author group
pub const GROUP_GAP_MINUTES: i64 = 5;

/// Entry shown on a timeline
pub trait TimelineEntry {
    fn author_id(&self) -> &str;
    fn created_at(&self) -> DateTime<Utc>;
}

impl TimelineEntry for Message {
    fn author_id(&self) -> &str {
        &self.sender_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl TimelineEntry for Note {
    fn author_id(&self) -> &str {
        &self.author_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Whether `current` opens a new author group after `previous`
pub fn starts_group<E: TimelineEntry>(previous: Option<&E>, current: &E) -> bool {
    match previous {
        None => true,
        Some(previous) => {
            previous.author_id() != current.author_id()
                || current.created_at() - previous.created_at() > Duration::minutes(GROUP_GAP_MINUTES)
        }
    }
}

/// Splits `entries` into consecutive author groups
pub fn group_entries<E: TimelineEntry>(entries: &[E]) -> Vec<&[E]> {
    let mut groups = Vec::new();
    let mut start = 0;

    for i in 1..entries.len() {
        if starts_group(Some(&entries[i - 1]), &entries[i]) {
            groups.push(&entries[start..i]);
            start = i;
        }
    }
    if start < entries.len() {
        groups.push(&entries[start..]);
    }

    groups
}

/// Appends a chat message; returns its id
///
/// # Errors
///
/// `FormError::Validation` if the body is blank
pub fn post_message(store: &mut EntityStore, sender_id: &str, body: &str) -> Result<String, FormError> {
    let body = BodyForm::new(body).into_body()?;
    let message = Message::new(generate_id(), sender_id, body);
    let id = message.id.clone();
    store.add(message);
    Ok(id)
}

fn anchor_exists(store: &EntityStore, anchor: &NoteAnchor) -> bool {
    match anchor {
        NoteAnchor::Contact(id) => store.contacts().contains(id),
        NoteAnchor::Task(id) => store.tasks().contains(id),
    }
}

/// Adds a note to a contact or task timeline; returns its id
///
/// # Errors
///
/// - `FormError::Validation` if the body is blank
/// - `FormError::NotFound` if the anchored record doesn't exist
pub fn add_note(store: &mut EntityStore, anchor: NoteAnchor, author_id: &str, body: &str) -> Result<String, FormError> {
    let body = BodyForm::new(body).into_body()?;

    if !anchor_exists(store, &anchor) {
        let kind = match anchor {
            NoteAnchor::Contact(_) => EntityKind::Contact,
            NoteAnchor::Task(_) => EntityKind::Task,
        };
        return Err(FormError::NotFound {
            kind,
            id: anchor.entity_id().to_string(),
        });
    }

    let note = Note::new(generate_id(), anchor, author_id, body);
    let id = note.id.clone();
    store.add(note);
    Ok(id)
}

/// Replaces a note's body in place
///
/// A blank edit is rejected and the note keeps its old body.
pub fn edit_note(store: &mut EntityStore, note_id: &str, body: &str) -> Result<(), FormError> {
    let body = BodyForm::new(body).into_body()?;

    if !store.update(note_id, NotePatch { body: Some(body) }) {
        return Err(FormError::NotFound {
            kind: EntityKind::Note,
            id: note_id.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{contact::Contact, task::Task};

    fn message(author: &str, minute: i64) -> Message {
        let base = DateTime::parse_from_rfc3339("2024-01-15T09:00:00Z").unwrap().with_timezone(&Utc);
        Message {
            created_at: base + Duration::minutes(minute),
            ..Message::new(format!("{author}-{minute}"), author, "hi")
        }
    }

    #[test]
    fn test_grouping_rules() {
        let a0 = message("a", 0);
        let a3 = message("a", 3);
        let a9 = message("a", 9);
        let b9 = message("b", 9);

        assert!(starts_group(None, &a0));
        assert!(!starts_group(Some(&a0), &a3));
        assert!(starts_group(Some(&a3), &a9));
        assert!(starts_group(Some(&a9), &b9));
    }

    #[test]
    fn test_exactly_five_minutes_continues_group() {
        assert!(!starts_group(Some(&message("a", 0)), &message("a", 5)));
    }

    #[test]
    fn test_group_entries() {
        let entries = vec![message("a", 0), message("a", 1), message("b", 2), message("b", 20)];
        let sizes: Vec<_> = group_entries(&entries).iter().map(|g| g.len()).collect();
        assert_eq!(sizes, [2, 1, 1]);
        assert!(group_entries::<Message>(&[]).is_empty());
    }

    #[test]
    fn test_post_message() {
        let mut store = EntityStore::new();
        let id = post_message(&mut store, "u1", "  **Shipped** ").unwrap();

        assert_eq!(store.messages().get(&id).map(|m| m.body.as_str()), Some("**Shipped**"));
        assert!(post_message(&mut store, "u1", "   ").is_err());
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn test_notes_on_contact_and_task() {
        let mut store = EntityStore::new();
        store.add(Contact::new("1", "Acme Corp"));
        store.add(Task::new("1", "Ship release"));

        add_note(&mut store, NoteAnchor::Contact("1".to_string()), "u1", "Called back").unwrap();
        add_note(&mut store, NoteAnchor::Task("1".to_string()), "u1", "Blocked on QA").unwrap();

        let contact_notes = store.notes_for(&NoteAnchor::Contact("1".to_string()));
        assert_eq!(contact_notes.len(), 1);
        assert_eq!(contact_notes[0].body, "Called back");

        let err = add_note(&mut store, NoteAnchor::Task("9".to_string()), "u1", "x").unwrap_err();
        assert!(matches!(err, FormError::NotFound { kind: EntityKind::Task, .. }));
    }

    #[test]
    fn test_edit_note() {
        let mut store = EntityStore::new();
        store.add(Contact::new("1", "Acme Corp"));
        let id = add_note(&mut store, NoteAnchor::Contact("1".to_string()), "u1", "Draft").unwrap();

        assert!(edit_note(&mut store, &id, "   ").is_err());
        assert_eq!(store.notes().get(&id).map(|n| n.body.as_str()), Some("Draft"));

        edit_note(&mut store, &id, " Final ").unwrap();
        let note = store.notes().get(&id).unwrap();
        assert_eq!(note.body, "Final");
        assert!(note.updated_at.is_some());
    }
}
