/// Application wiring
///
/// `App` owns the entity store, the session manager and the storage backend.
/// `bootstrap` builds the HTTP-backed services from configuration; `start`
/// takes any implementation of the boundaries, which is how the tests run
/// the whole client without a network.
///
/// # Example
///
/// ```no_run
/// use pulsehq_client::{app::App, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let mut app = App::bootstrap(config).await?;
/// app.sign_in("alice@example.com", "hunter22").await?;
/// app.shutdown()?;
/// # Ok(())
/// # }
/// ```

use std::sync::Arc;

use pulsehq_shared::auth::identity::{AuthError, IdentityProvider, Session, SignUpMetadata};
use pulsehq_shared::auth::profile::Profile;
use pulsehq_shared::auth::replication::ProfileReplicator;
use pulsehq_shared::auth::session::{spawn_session_listener, SessionManager, SignUpOutcome};
use pulsehq_shared::store::{EntityStore, FileStorage, PersistError, StateStorage};
use tokio::task::JoinHandle;

use crate::{config::Config, gotrue::GoTrueClient, rest::RestReplicator};

/// Key the last session is stored under, next to the store snapshot
pub const SESSION_KEY: &str = "pulsehq-auth-session";

/// Running client
pub struct App {
    config: Arc<Config>,
    storage: Arc<dyn StateStorage>,
    store: EntityStore,
    session: Arc<SessionManager>,
    listener: JoinHandle<()>,
}

impl App {
    /// Builds the HTTP services and file storage from `config` and starts
    pub async fn bootstrap(config: Config) -> anyhow::Result<Self> {
        let timeout = config.http.timeout();
        let identity = Arc::new(GoTrueClient::new(&config.identity, timeout)?);
        let replicator = Arc::new(RestReplicator::new(&config.identity, timeout)?);
        let storage: Arc<dyn StateStorage> = Arc::new(FileStorage::new(&config.storage.state_dir)?);

        identity.restore_session(load_session(storage.as_ref()));

        Self::start(config, storage, identity, replicator).await
    }

    /// Restores local state and any existing session
    ///
    /// A corrupt snapshot is logged and replaced by an empty store. A failure
    /// to restore the session leaves the client signed out.
    pub async fn start(
        config: Config,
        storage: Arc<dyn StateStorage>,
        provider: Arc<dyn IdentityProvider>,
        replicator: Arc<dyn ProfileReplicator>,
    ) -> anyhow::Result<Self> {
        let store = match EntityStore::load_from(storage.as_ref()) {
            Ok(store) => store,
            Err(PersistError::Json(err)) => {
                tracing::warn!(error = %err, "Discarding unreadable local state");
                EntityStore::new()
            }
            Err(err) => return Err(err.into()),
        };

        let session = Arc::new(SessionManager::new(provider, replicator));
        let listener = spawn_session_listener(session.clone());

        let mut app = Self {
            config: Arc::new(config),
            storage,
            store,
            session,
            listener,
        };

        match app.session.initialize().await {
            Ok(Some(profile)) => {
                app.on_signed_in(&profile);
            }
            Ok(None) => tracing::info!("No existing session"),
            Err(err) => tracing::warn!(error = %err, "Could not restore session"),
        }

        Ok(app)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// Loads the demo workspace into an empty store
    ///
    /// Returns whether anything was loaded. Existing tasks or contacts are
    /// never overwritten.
    pub fn on_signed_in(&mut self, profile: &Profile) -> bool {
        if !self.config.seed_demo || !self.store.tasks().is_empty() || !self.store.contacts().is_empty() {
            return false;
        }

        self.store.seed_sample_data();
        tracing::info!(user_id = %profile.id, "Loaded demo workspace");
        true
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let profile = self.session.sign_in(email, password).await?;
        self.on_signed_in(&profile);
        Ok(profile)
    }

    pub async fn sign_up(
        &mut self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.session.sign_up(email, password, metadata).await?;
        if let SignUpOutcome::SignedIn(profile) = &outcome {
            self.on_signed_in(profile);
        }
        Ok(outcome)
    }

    /// Signs out; the local session is cleared even if the service call fails
    pub async fn sign_out(&mut self) -> Result<(), AuthError> {
        let result = self.session.sign_out().await;
        if let Err(err) = self.storage.remove(SESSION_KEY) {
            tracing::warn!(error = %err, "Could not remove stored session");
        }
        result
    }

    /// Writes the store snapshot and the current session to storage
    pub fn persist(&self) -> Result<(), PersistError> {
        self.store.save_to(self.storage.as_ref())?;

        match self.session.state().session() {
            Some(session) => self.storage.save(SESSION_KEY, &serde_json::to_string(session)?)?,
            None => self.storage.remove(SESSION_KEY)?,
        }

        tracing::debug!(revision = self.store.revision(), "Persisted local state");
        Ok(())
    }

    /// Persists and stops the session listener
    pub fn shutdown(self) -> Result<(), PersistError> {
        let result = self.persist();
        self.listener.abort();
        result
    }
}

/// Reads the stored session, ignoring anything unreadable
pub fn load_session(storage: &dyn StateStorage) -> Option<Session> {
    let raw = match storage.load(SESSION_KEY) {
        Ok(raw) => raw?,
        Err(err) => {
            tracing::warn!(error = %err, "Could not read stored session");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(error = %err, "Discarding unreadable stored session");
            None
        }
    }
}
