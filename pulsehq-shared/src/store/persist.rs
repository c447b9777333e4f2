/// Local persistence of the store
///
/// A subset of the store is saved as one untyped JSON object under the fixed
/// key [`STORAGE_KEY`]:
///
/// ```json
/// {
///   "tasks": [...],
///   "contacts": [...],
///   "messages": [...],
///   "teamMembers": [...],
///   "sidebarOpen": true
/// }
/// ```
///
/// There is no version field and no migration. Every key is optional when
/// loading, so snapshots written before a field existed still load.
///
/// # Example
///
/// ```
/// use pulsehq_shared::store::{EntityStore, MemoryStorage, StateStorage};
/// use pulsehq_shared::models::task::Task;
///
/// # fn example() -> Result<(), pulsehq_shared::store::PersistError> {
/// let storage = MemoryStorage::default();
///
/// let mut store = EntityStore::new();
/// store.add(Task::new("1", "Ship release"));
/// store.save_to(&storage)?;
///
/// let restored = EntityStore::load_from(&storage)?;
/// assert_eq!(restored.tasks().len(), 1);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Collection, EntityStore};
use crate::models::{contact::Contact, message::Message, task::Task, user::User};

/// Key the snapshot is stored under
pub const STORAGE_KEY: &str = "pulsehq-storage";

/// Error type for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading or writing the backing medium failed
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data is not valid JSON for the snapshot shape
    #[error("Stored state is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Persisted subset of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub tasks: Vec<Task>,

    #[serde(default)]
    pub contacts: Vec<Contact>,

    #[serde(default)]
    pub messages: Vec<Message>,

    #[serde(default)]
    pub team_members: Vec<User>,

    #[serde(default = "default_sidebar_open")]
    pub sidebar_open: bool,
}

fn default_sidebar_open() -> bool {
    true
}

impl PersistedState {
    pub fn from_json(raw: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Key-value backend for persisted state
pub trait StateStorage: Send + Sync {
    /// Reads the value under `key`; `None` when nothing was saved yet
    fn load(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Writes `value` under `key`, replacing any previous value
    fn save(&self, key: &str, value: &str) -> Result<(), PersistError>;

    /// Removes the value under `key`; missing keys are not an error
    fn remove(&self, key: &str) -> Result<(), PersistError>;
}

/// Stores each key as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the storage, creating `dir` if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        // Write-then-rename so a crash never leaves a truncated snapshot
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Process-local storage, used in tests and when persistence is disabled
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, PersistError> {
        self.values
            .lock()
            .map_err(|_| PersistError::Backend("memory storage lock poisoned".to_string()))
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.values()?.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistError> {
        self.values()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.values()?.remove(key);
        Ok(())
    }
}

impl EntityStore {
    /// Builds a store from a persisted snapshot
    ///
    /// Notes and selection are not persisted and start empty.
    pub fn from_persisted(state: PersistedState) -> Self {
        let mut store = Self::new();
        store.tasks = Collection::from_vec(state.tasks);
        store.contacts = Collection::from_vec(state.contacts);
        store.messages = Collection::from_vec(state.messages);
        store.users = Collection::from_vec(state.team_members);
        store.ui.sidebar_open = state.sidebar_open;
        store
    }

    /// Extracts the persisted subset
    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            tasks: self.tasks.iter().cloned().collect(),
            contacts: self.contacts.iter().cloned().collect(),
            messages: self.messages.iter().cloned().collect(),
            team_members: self.users.iter().cloned().collect(),
            sidebar_open: self.ui.sidebar_open,
        }
    }

    /// Restores from `storage`, or returns an empty store if nothing is saved
    pub fn load_from(storage: &dyn StateStorage) -> Result<Self, PersistError> {
        match storage.load(STORAGE_KEY)? {
            Some(raw) => {
                let state = PersistedState::from_json(&raw)?;
                tracing::debug!(
                    tasks = state.tasks.len(),
                    contacts = state.contacts.len(),
                    messages = state.messages.len(),
                    "Restored persisted state"
                );
                Ok(Self::from_persisted(state))
            }
            None => Ok(Self::new()),
        }
    }

    /// Writes the persisted subset to `storage`
    pub fn save_to(&self, storage: &dyn StateStorage) -> Result<(), PersistError> {
        storage.save(STORAGE_KEY, &self.to_persisted().to_json()?)
    }
}
