/// Integration tests for entity store behaviour
///
/// Covers update/delete semantics, selection exclusivity, drag-and-drop
/// and search through the public API only.
///
/// Run with: cargo test --test store_properties_tests

use pulsehq_shared::board::drag::{DragController, DropOutcome};
use pulsehq_shared::board::search::{filter_tasks, global_search, StatusFilter};
use pulsehq_shared::models::contact::{Contact, ContactPatch, ContactStatus};
use pulsehq_shared::models::message::Message;
use pulsehq_shared::models::task::{Task, TaskPatch, TaskPriority, TaskStatus};
use pulsehq_shared::store::EntityStore;
use std::sync::Arc;

/// Helper to build a store with two tasks and two contacts
fn populated_store() -> EntityStore {
    let mut store = EntityStore::new();
    store.add(Task::new("t1", "Design landing page"));
    store.add(Task {
        status: TaskStatus::Doing,
        ..Task::new("t2", "Update docs")
    });
    store.add(Contact::new("c1", "Acme Corp"));
    store.add(Contact {
        status: ContactStatus::Client,
        ..Contact::new("c2", "Jane Wilson")
    });
    store
}

#[test]
fn test_update_changes_only_patched_field() {
    let mut store = populated_store();
    let before = store.get::<Task>("t1").cloned().unwrap();

    assert!(store.update(
        "t1",
        TaskPatch {
            priority: Some(TaskPriority::Urgent),
            ..Default::default()
        }
    ));

    let after = store.get::<Task>("t1").unwrap();
    assert_eq!(after.priority, TaskPriority::Urgent);
    assert_eq!(
        Task {
            priority: before.priority,
            ..after.clone()
        },
        before
    );
}

#[test]
fn test_update_unknown_id_leaves_collection_identical() {
    let mut store = populated_store();
    let tasks = store.tasks().snapshot();
    let contacts = store.contacts().snapshot();

    assert!(!store.update("nope", TaskPatch::status(TaskStatus::Done)));
    assert!(!store.update("nope", ContactPatch::status(ContactStatus::Inactive)));

    assert!(Arc::ptr_eq(&tasks, &store.tasks().snapshot()));
    assert!(Arc::ptr_eq(&contacts, &store.contacts().snapshot()));
}

#[test]
fn test_delete_removes_exactly_one_and_clears_selection() {
    let mut store = populated_store();
    store.select_contact("c2");
    assert!(store.inspector_open());

    assert!(store.delete::<Contact>("c2"));

    assert_eq!(store.contacts().len(), 1);
    assert!(store.contacts().get("c1").is_some());
    assert!(store.selected_contact().is_none());
    assert!(!store.inspector_open());
}

#[test]
fn test_delete_of_unselected_keeps_selection() {
    let mut store = populated_store();
    store.select_task("t1");

    store.delete::<Task>("t2");

    assert_eq!(store.selected_task().map(|t| t.id.as_str()), Some("t1"));
    assert!(store.inspector_open());
}

#[test]
fn test_selection_is_exclusive() {
    let mut store = populated_store();

    store.select_task("t1");
    store.set_selected_contact(store.get::<Contact>("c1").cloned());
    assert!(store.selected_task().is_none());
    assert!(store.selected_contact().is_some());

    store.set_selected_task(store.get::<Task>("t2").cloned());
    assert!(store.selected_contact().is_none());
    assert_eq!(store.selected_task().map(|t| t.id.as_str()), Some("t2"));
}

#[test]
fn test_drag_onto_own_column_does_not_mutate() {
    let mut store = populated_store();
    let before = store.tasks().snapshot();

    let outcome = DragController::<Task>::new().on_drag_end(&mut store, "t2", Some("doing"));

    assert_eq!(outcome, DropOutcome::SameColumn);
    assert!(Arc::ptr_eq(&before, &store.tasks().snapshot()));
}

#[test]
fn test_drag_todo_to_done() {
    let mut store = populated_store();
    let untouched = store.get::<Task>("t2").cloned();

    DragController::<Task>::new().on_drag_end(&mut store, "t1", Some("done"));

    assert_eq!(store.get::<Task>("t1").map(|t| t.status), Some(TaskStatus::Done));
    assert_eq!(store.get::<Task>("t2").cloned(), untouched);
}

#[test]
fn test_invalid_contact_drop_does_not_mutate() {
    let mut store = populated_store();
    let before = store.contacts().snapshot();

    for target in ["todo", "archived", ""] {
        let outcome = DragController::<Contact>::new().on_drag_end(&mut store, "c1", Some(target));
        assert_eq!(outcome, DropOutcome::InvalidTarget(target.to_string()));
    }

    assert!(Arc::ptr_eq(&before, &store.contacts().snapshot()));
}

#[test]
fn test_search_design() {
    let mut store = EntityStore::new();
    store.add(Task::new("1", "Design landing page"));
    store.add(Task::new("2", "Update docs"));

    for query in ["design", "Design", "DESIGN"] {
        let local = filter_tasks(&store, query, StatusFilter::All);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].id, "1");

        let global = global_search(&store, query);
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].id, "1");
    }

    assert!(global_search(&store, "").is_empty());
    assert_eq!(filter_tasks(&store, "", StatusFilter::All).len(), 2);
}

#[test]
fn test_snapshot_is_isolated_from_later_mutations() {
    let mut store = populated_store();
    store.add(Message::new("m1", "u1", "hello"));
    let snapshot = store.snapshot();

    store.update("t1", TaskPatch::status(TaskStatus::Done));
    store.delete::<Contact>("c1");

    assert_eq!(snapshot.tasks[0].status, TaskStatus::Todo);
    assert_eq!(snapshot.contacts.len(), 2);
    assert!(store.revision() > snapshot.revision);
}
