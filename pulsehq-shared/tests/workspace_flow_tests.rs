/// End-to-end tests of the sign-in → board → persist flow
///
/// Uses the in-memory identity provider and recording replicator, so no
/// network service is needed.

use pulsehq_shared::auth::authorization::{require_permission, Permission};
use pulsehq_shared::auth::identity::AuthError;
use pulsehq_shared::auth::memory::InMemoryIdentityProvider;
use pulsehq_shared::auth::replication::{RecordingReplicator, ReplicationCall};
use pulsehq_shared::auth::session::{AuthState, SessionManager};
use pulsehq_shared::board::drag::DragController;
use pulsehq_shared::board::forms::{delete_task, save_task, TaskForm};
use pulsehq_shared::models::note::NoteAnchor;
use pulsehq_shared::models::task::{Task, TaskStatus};
use pulsehq_shared::board::timeline::add_note;
use pulsehq_shared::store::{EntityStore, FileStorage};
use std::sync::Arc;

#[test]
fn test_create_drag_delete_scenario() {
    let mut store = EntityStore::new();

    let form = TaskForm {
        title: "Ship release".to_string(),
        ..Default::default()
    };
    let id = save_task(&mut store, None, &form).unwrap();
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(store.get::<Task>(&id).map(|t| t.status), Some(TaskStatus::Todo));

    DragController::<Task>::new().on_drag_end(&mut store, &id, Some("doing"));
    assert_eq!(store.get::<Task>(&id).map(|t| t.status), Some(TaskStatus::Doing));

    store.select_task(&id);
    assert!(delete_task(&mut store, &id, true));
    assert!(store.tasks().is_empty());
    assert!(store.selected_task().is_none());
    assert!(!store.inspector_open());
}

#[test]
fn test_notes_survive_entity_delete() {
    let mut store = EntityStore::new();
    store.add(Task::new("1", "Ship release"));
    add_note(&mut store, NoteAnchor::Task("1".to_string()), "u1", "QA passed").unwrap();

    store.delete::<Task>("1");

    assert_eq!(store.notes().len(), 1);
}

#[test]
fn test_state_persists_across_restarts() {
    let dir = tempfile::tempdir().unwrap();

    {
        let storage = FileStorage::new(dir.path()).unwrap();
        let mut store = EntityStore::new();
        store.seed_sample_data();
        store.set_sidebar_open(false);
        store.save_to(&storage).unwrap();
    }

    let storage = FileStorage::new(dir.path()).unwrap();
    let restored = EntityStore::load_from(&storage).unwrap();
    assert_eq!(restored.tasks().len(), 3);
    assert_eq!(restored.users().len(), 3);
    assert!(!restored.ui().sidebar_open());
    assert!(restored.selected_task().is_none());
}

#[tokio::test]
async fn test_sign_in_with_failing_replication() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.register("alice@x.com", "hunter22", Some("Alice")).unwrap();
    let replicator = Arc::new(RecordingReplicator::failing());
    let manager = SessionManager::new(provider, replicator.clone());

    let profile = manager.sign_in("alice@x.com", "hunter22").await.unwrap();
    replicator.wait_for(1).await;

    // Replication failed but the session stands
    assert!(matches!(replicator.calls()[0], ReplicationCall::Workspace(_)));
    assert!(manager.is_authenticated());
    assert_eq!(profile.name, "Alice");
    assert!(require_permission(manager.profile().as_ref(), Permission::ManageWorkspace).is_ok());
}

#[tokio::test]
async fn test_sign_out_local_state_wins() {
    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.register("alice@x.com", "hunter22", None).unwrap();
    let manager = SessionManager::new(provider.clone(), Arc::new(RecordingReplicator::new()));

    let profile = manager.sign_in("alice@x.com", "hunter22").await.unwrap();
    assert_eq!(profile.name, "alice");

    provider.set_offline(true);
    let err = manager.sign_out().await.unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert_eq!(manager.state(), AuthState::Anonymous);
    assert!(!manager.is_admin());
}
