/// Startup and shutdown against file storage
///
/// Runs the client wiring with the in-memory identity provider so no
/// network service is needed.

use pulsehq_client::app::{load_session, App, SESSION_KEY};
use pulsehq_client::config::Config;
use pulsehq_shared::auth::memory::InMemoryIdentityProvider;
use pulsehq_shared::auth::replication::{RecordingReplicator, ReplicationCall};
use pulsehq_shared::board::drag::DragController;
use pulsehq_shared::models::task::{Task, TaskStatus};
use pulsehq_shared::store::{FileStorage, StateStorage};
use std::path::Path;
use std::sync::Arc;

fn config(state_dir: &Path) -> Config {
    let state_dir = state_dir.display().to_string();
    Config::from_lookup(move |name| match name {
        "PULSEHQ_AUTH_URL" => Some("http://localhost:54321".to_string()),
        "PULSEHQ_AUTH_KEY" => Some("anon-key".to_string()),
        "PULSEHQ_STATE_DIR" => Some(state_dir.clone()),
        _ => None,
    })
    .unwrap()
}

#[tokio::test]
async fn test_board_changes_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path());
    let storage: Arc<dyn StateStorage> = Arc::new(FileStorage::new(&config.storage.state_dir).unwrap());

    let provider = Arc::new(InMemoryIdentityProvider::new());
    provider.register("alice@x.com", "hunter22", Some("Alice")).unwrap();
    let replicator = Arc::new(RecordingReplicator::new());

    let mut app = App::start(config.clone(), storage.clone(), provider.clone(), replicator.clone())
        .await
        .unwrap();
    let profile = app.sign_in("alice@x.com", "hunter22").await.unwrap();

    replicator.wait_for(2).await;
    assert!(matches!(&replicator.calls()[0], ReplicationCall::Workspace(w) if w.id == profile.workspace_id));

    let first = app.store().tasks().iter().next().map(|t| t.id.clone()).unwrap();
    DragController::<Task>::new().on_drag_end(app.store_mut(), &first, Some("done"));
    app.shutdown().unwrap();

    assert!(load_session(storage.as_ref()).is_some());
    assert!(dir.path().join(format!("{SESSION_KEY}.json")).exists());

    let app = App::start(config, storage, provider, Arc::new(RecordingReplicator::new()))
        .await
        .unwrap();
    assert_eq!(app.session().profile().map(|p| p.id), Some(profile.id));
    assert_eq!(app.store().get::<Task>(&first).map(|t| t.status), Some(TaskStatus::Done));
}
