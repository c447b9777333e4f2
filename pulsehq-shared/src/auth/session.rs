/// Authentication session manager
///
/// Owns the session lifecycle of the single signed-in user:
///
/// ```text
/// Anonymous --sign_in/sign_up--> Pending --ok--> Authenticated
///                                    |  \--no session--> ConfirmationPending
///                                    \--err--> Anonymous
/// Authenticated --sign_out--> Anonymous
/// ```
///
/// The current [`AuthState`] is published on a `tokio::sync::watch` channel
/// so any number of observers see every transition.
///
/// # Stale results
///
/// Every state-changing operation takes a ticket from a monotonically
/// increasing epoch. When the remote call returns, its result is applied only
/// if no newer operation has started in the meantime; otherwise it is
/// discarded and the caller gets [`AuthError::Superseded`]. A slow sign-in
/// can therefore never overwrite a later sign-out.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pulsehq_shared::auth::memory::InMemoryIdentityProvider;
/// use pulsehq_shared::auth::replication::NoopReplicator;
/// use pulsehq_shared::auth::session::SessionManager;
///
/// # async fn example() -> Result<(), pulsehq_shared::auth::identity::AuthError> {
/// let manager = SessionManager::new(
///     Arc::new(InMemoryIdentityProvider::new()),
///     Arc::new(NoopReplicator),
/// );
///
/// let profile = manager.sign_in("alice@x.com", "hunter22").await?;
/// println!("Welcome, {}", profile.name);
/// # Ok(())
/// # }
/// ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::identity::{AuthError, IdentityProvider, Session, SignUpMetadata, UserMetadata};
use super::profile::{derive_profile, Profile};
use super::replication::{replicate_in_background, ProfileReplicator};

/// Message shown after any password-reset request that reached the service
pub const RESET_EMAIL_SENT: &str = "If an account exists for that email, a password reset link has been sent.";

/// Authentication state
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// No session
    #[default]
    Anonymous,

    /// A sign-in, sign-up or session restore is in flight
    Pending,

    /// Signed in
    Authenticated { session: Session, profile: Profile },

    /// Signed up; waiting for the user to confirm their email
    ConfirmationPending { email: String },
}

impl AuthState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated { profile, .. } => Some(profile),
            _ => None,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AuthState::Pending)
    }
}

/// Result of a successful sign-up
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The service issued a session right away
    SignedIn(Profile),

    /// The service requires email confirmation first
    ConfirmationRequired { email: String },
}

/// Epoch value meaning "never signed out"
const NOT_SIGNED_OUT: u64 = u64::MAX;

/// Session manager
pub struct SessionManager {
    provider: Arc<dyn IdentityProvider>,
    replicator: Arc<dyn ProfileReplicator>,
    state: watch::Sender<AuthState>,
    epoch: AtomicU64,
    /// Epoch published by the last explicit sign-out
    signed_out_at: AtomicU64,
}

impl SessionManager {
    /// Creates a manager in the `Anonymous` state
    pub fn new(provider: Arc<dyn IdentityProvider>, replicator: Arc<dyn ProfileReplicator>) -> Self {
        let (state, _) = watch::channel(AuthState::Anonymous);
        Self {
            provider,
            replicator,
            state,
            epoch: AtomicU64::new(0),
            signed_out_at: AtomicU64::new(NOT_SIGNED_OUT),
        }
    }

    /// Current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Profile of the signed-in user
    pub fn profile(&self) -> Option<Profile> {
        self.state.borrow().profile().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_pending()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().profile().is_some_and(Profile::is_admin)
    }

    pub fn is_owner(&self) -> bool {
        self.state.borrow().profile().is_some_and(Profile::is_owner)
    }

    /// Takes a new ticket, publishing `next` in the same step
    ///
    /// Tickets and state changes are both made under the state channel's
    /// lock, so a ticket check and the write it guards can't interleave with
    /// another request.
    fn begin(&self, next: Option<AuthState>) -> u64 {
        let mut ticket = 0;
        self.state.send_if_modified(|state| {
            ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            match next {
                Some(next) => {
                    *state = next;
                    true
                }
                None => false,
            }
        });
        ticket
    }

    /// Publishes `next` if `ticket` is still the newest; returns whether it did
    fn commit(&self, ticket: u64, next: AuthState) -> bool {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *state = next;
            true
        })
    }

    /// Whether an explicit sign-out is the newest request
    fn is_signed_out(&self) -> bool {
        self.signed_out_at.load(Ordering::SeqCst) == self.epoch.load(Ordering::SeqCst)
    }

    /// Publishes `Authenticated` for `session` if `ticket` is current, then
    /// starts replication
    fn establish(&self, ticket: u64, session: Session, operation: &'static str) -> Result<Profile, AuthError> {
        let profile = derive_profile(&session.user);
        let access_token = session.access_token.clone();

        let next = AuthState::Authenticated {
            session,
            profile: profile.clone(),
        };
        if !self.commit(ticket, next) {
            return Err(self.discard(operation));
        }

        replicate_in_background(self.replicator.clone(), access_token, &profile);
        tracing::info!(user_id = %profile.id, workspace_id = %profile.workspace_id, "Signed in");
        Ok(profile)
    }

    fn discard(&self, operation: &'static str) -> AuthError {
        tracing::debug!(operation, "Discarding result of superseded auth request");
        AuthError::Superseded
    }

    /// Drops a session the provider issued after the user signed out
    async fn revoke_late_session(&self, operation: &'static str) {
        if !self.is_signed_out() {
            return;
        }
        tracing::info!(operation, "Revoking session issued after sign-out");
        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "Failed to revoke late session");
        }
    }

    /// Restores the session the provider already holds
    ///
    /// Returns the profile when a session was found. Provider errors leave the
    /// manager `Anonymous`.
    pub async fn initialize(&self) -> Result<Option<Profile>, AuthError> {
        let ticket = self.begin(Some(AuthState::Pending));

        match self.provider.current_session().await {
            Ok(Some(session)) => self.establish(ticket, session, "initialize").map(Some),
            Ok(None) => {
                if !self.commit(ticket, AuthState::Anonymous) {
                    return Err(self.discard("initialize"));
                }
                Ok(None)
            }
            Err(e) => {
                if !self.commit(ticket, AuthState::Anonymous) {
                    return Err(self.discard("initialize"));
                }
                tracing::warn!(error = %e, "Failed to restore session");
                Err(e)
            }
        }
    }

    /// Email/password sign-in
    ///
    /// # Errors
    ///
    /// - The provider's error (state returns to `Anonymous`)
    /// - `AuthError::Superseded` if a newer auth operation started meanwhile
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let ticket = self.begin(Some(AuthState::Pending));

        match self.provider.sign_in(email.trim(), password).await {
            Ok(session) => {
                let result = self.establish(ticket, session, "sign_in");
                if result.is_err() {
                    self.revoke_late_session("sign_in").await;
                }
                result
            }
            Err(e) => {
                if !self.commit(ticket, AuthState::Anonymous) {
                    return Err(self.discard("sign_in"));
                }
                tracing::debug!(error = %e, "Sign-in failed");
                Err(e)
            }
        }
    }

    /// Creates an account
    ///
    /// When the service withholds the session pending email confirmation the
    /// state becomes `ConfirmationPending`.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: SignUpMetadata,
    ) -> Result<SignUpOutcome, AuthError> {
        let ticket = self.begin(Some(AuthState::Pending));

        let metadata = metadata.normalized();
        let email = email.trim();
        if metadata.invite_token.is_some() {
            tracing::debug!(email, "Sign-up with invitation");
        }

        match self.provider.sign_up(email, password, &metadata).await {
            Ok(response) => match response.session {
                Some(session) => {
                    let result = self.establish(ticket, session, "sign_up");
                    if result.is_err() {
                        self.revoke_late_session("sign_up").await;
                    }
                    result.map(SignUpOutcome::SignedIn)
                }
                None => {
                    let next = AuthState::ConfirmationPending {
                        email: email.to_string(),
                    };
                    if !self.commit(ticket, next) {
                        return Err(self.discard("sign_up"));
                    }
                    tracing::info!(user_id = %response.user.id, "Sign-up awaiting email confirmation");
                    Ok(SignUpOutcome::ConfirmationRequired {
                        email: email.to_string(),
                    })
                }
            },
            Err(e) => {
                if !self.commit(ticket, AuthState::Anonymous) {
                    return Err(self.discard("sign_up"));
                }
                Err(e)
            }
        }
    }

    /// Requests a password-reset email
    ///
    /// Any answer from the service yields the same generic message so callers
    /// can't tell which emails are registered. Only transport failures are
    /// returned as errors. Auth state is not touched.
    pub async fn reset_password(&self, email: &str) -> Result<&'static str, AuthError> {
        match self.provider.send_password_reset(email.trim()).await {
            Ok(()) => Ok(RESET_EMAIL_SENT),
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Password reset rejected; reporting success");
                Ok(RESET_EMAIL_SENT)
            }
        }
    }

    /// Signs out
    ///
    /// Local state becomes `Anonymous` before the remote call is made and
    /// stays that way even if the remote call fails; the remote error is
    /// still returned for logging. Sessions the provider pushes afterwards
    /// are ignored until the next sign-in, sign-up or restore.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.state.send_modify(|state| {
            let ticket = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
            self.signed_out_at.store(ticket, Ordering::SeqCst);
            *state = AuthState::Anonymous;
        });

        if let Err(e) = self.provider.sign_out().await {
            tracing::warn!(error = %e, "Remote sign-out failed; local session cleared");
            return Err(e);
        }

        tracing::info!("Signed out");
        Ok(())
    }

    /// Changes the display name stored in the identity metadata
    ///
    /// The profile is re-derived from the updated identity and replicated.
    pub async fn update_display_name(&self, name: &str) -> Result<Profile, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::Provider {
                status: None,
                message: "Name is required".to_string(),
            });
        }

        let mut session = self
            .state
            .borrow()
            .session()
            .cloned()
            .ok_or(AuthError::NotAuthenticated)?;

        let ticket = self.begin(None);
        let identity = self.provider.update_user_metadata(&UserMetadata::with_name(name)).await?;

        session.user = identity;
        self.establish(ticket, session, "update_display_name")
    }

    /// Applies a session change pushed by the provider
    ///
    /// - While a request is pending the push is ignored; that request
    ///   publishes its own result.
    /// - After an explicit sign-out, pushed sessions are ignored until a new
    ///   request starts.
    /// - A refreshed session for the user already signed in replaces the
    ///   session without re-deriving or replicating.
    /// - Changed claims for the same user re-derive the profile without
    ///   superseding an in-flight request.
    pub fn apply_session_change(&self, session: Option<Session>) {
        let Some(session) = session else {
            self.state.send_if_modified(|state| {
                if !state.is_authenticated() {
                    return false;
                }
                self.epoch.fetch_add(1, Ordering::SeqCst);
                tracing::info!("Session ended by identity service");
                *state = AuthState::Anonymous;
                true
            });
            return;
        };

        let access_token = session.access_token.clone();
        let profile = derive_profile(&session.user);
        let mut replicate = false;

        self.state.send_if_modified(|state| match state {
            AuthState::Pending => {
                tracing::debug!("Ignoring session push while a request is pending");
                false
            }
            AuthState::Authenticated {
                session: held,
                profile: held_profile,
            } if held.user.id == session.user.id => {
                if held.user != session.user {
                    *held_profile = profile.clone();
                    replicate = true;
                }
                *held = session;
                true
            }
            _ if self.is_signed_out() => {
                tracing::debug!(user_id = %session.user.id, "Ignoring session pushed after sign-out");
                false
            }
            _ => {
                self.epoch.fetch_add(1, Ordering::SeqCst);
                *state = AuthState::Authenticated {
                    session,
                    profile: profile.clone(),
                };
                replicate = true;
                true
            }
        });

        if replicate {
            replicate_in_background(self.replicator.clone(), access_token, &profile);
            tracing::info!(user_id = %profile.id, workspace_id = %profile.workspace_id, "Session updated by identity service");
        }
    }
}

/// Forwards the provider's session-change events into `manager`
///
/// The listener ends when the provider drops its sender or the handle is
/// aborted.
pub fn spawn_session_listener(manager: Arc<SessionManager>) -> JoinHandle<()> {
    let mut changes = manager.provider.subscribe();

    tokio::spawn(async move {
        while changes.changed().await.is_ok() {
            let session = changes.borrow_and_update().clone();
            manager.apply_session_change(session);
        }
        tracing::debug!("Session listener stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::InMemoryIdentityProvider;
    use crate::auth::replication::{RecordingReplicator, ReplicationCall};
    use crate::models::user::UserRole;
    use std::time::Duration;

    fn manager_with(provider: Arc<InMemoryIdentityProvider>) -> (SessionManager, Arc<RecordingReplicator>) {
        let replicator = Arc::new(RecordingReplicator::new());
        (SessionManager::new(provider, replicator.clone()), replicator)
    }

    fn provider_with_alice() -> Arc<InMemoryIdentityProvider> {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        provider.register("alice@x.com", "hunter22", Some("Alice")).unwrap();
        provider
    }

    #[tokio::test]
    async fn test_sign_in_derives_profile() {
        let (manager, replicator) = manager_with(provider_with_alice());

        let profile = manager.sign_in("alice@x.com", "hunter22").await.unwrap();

        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.role, UserRole::Owner);
        assert!(manager.is_authenticated());
        assert!(manager.is_owner());
        assert_eq!(manager.profile(), Some(profile.clone()));

        replicator.wait_for(2).await;
        assert!(matches!(&replicator.calls()[0], ReplicationCall::Workspace(w) if w.id == profile.workspace_id));
    }

    #[tokio::test]
    async fn test_failed_sign_in_returns_to_anonymous() {
        let (manager, _) = manager_with(provider_with_alice());
        let mut states = manager.subscribe();

        let err = manager.sign_in("alice@x.com", "wrong").await.unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(manager.state(), AuthState::Anonymous);
        // Pending was published on the way
        assert!(states.has_changed().unwrap());
        assert_eq!(*states.borrow_and_update(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_sign_up_with_confirmation() {
        let provider = Arc::new(InMemoryIdentityProvider::require_confirmation());
        let (manager, replicator) = manager_with(provider);

        let outcome = manager.sign_up("bob@x.com", "hunter22", SignUpMetadata::with_name("Bob")).await.unwrap();

        assert_eq!(
            outcome,
            SignUpOutcome::ConfirmationRequired {
                email: "bob@x.com".to_string()
            }
        );
        assert_eq!(
            manager.state(),
            AuthState::ConfirmationPending {
                email: "bob@x.com".to_string()
            }
        );
        assert!(replicator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_sign_up_signs_in_immediately() {
        let (manager, _) = manager_with(Arc::new(InMemoryIdentityProvider::new()));

        let outcome = manager.sign_up("bob@x.com", "hunter22", SignUpMetadata::with_name("  ")).await.unwrap();

        match outcome {
            SignUpOutcome::SignedIn(profile) => assert_eq!(profile.name, "bob"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sign_out_clears_state_even_when_remote_fails() {
        let provider = provider_with_alice();
        let (manager, _) = manager_with(provider.clone());
        manager.sign_in("alice@x.com", "hunter22").await.unwrap();

        provider.set_fail_sign_out(true);
        assert!(manager.sign_out().await.is_err());

        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(manager.profile().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_sign_in_does_not_override_sign_out() {
        let provider = provider_with_alice();
        provider.set_latency(Duration::from_millis(500));
        let (manager, replicator) = manager_with(provider.clone());
        let manager = Arc::new(manager);
        let listener = spawn_session_listener(manager.clone());

        let slow = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_in("alice@x.com", "hunter22").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(manager.is_loading());

        let _ = manager.sign_out().await;
        assert!(!manager.is_authenticated());
        assert_eq!(slow.await.unwrap(), Err(AuthError::Superseded));

        // Give the listener time to see every push
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(provider.subscribe().borrow().is_none());
        assert!(replicator.calls().is_empty());

        listener.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_sign_in_after_failed_remote_sign_out() {
        let provider = provider_with_alice();
        provider.set_latency(Duration::from_millis(500));
        provider.set_fail_sign_out(true);
        let (manager, _) = manager_with(provider.clone());
        let manager = Arc::new(manager);
        let listener = spawn_session_listener(manager.clone());

        let slow = tokio::spawn({
            let manager = manager.clone();
            async move { manager.sign_in("alice@x.com", "hunter22").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(manager.sign_out().await.is_err());
        assert_eq!(slow.await.unwrap(), Err(AuthError::Superseded));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(manager.state(), AuthState::Anonymous);
        assert!(manager.profile().is_none());

        listener.abort();
    }

    #[tokio::test]
    async fn test_push_after_sign_out_is_ignored_until_next_sign_in() {
        let provider = provider_with_alice();
        let (manager, _) = manager_with(provider.clone());

        manager.sign_in("alice@x.com", "hunter22").await.unwrap();
        manager.sign_out().await.unwrap();

        manager.apply_session_change(Some(provider.session_for("alice@x.com").unwrap()));
        assert_eq!(manager.state(), AuthState::Anonymous);

        manager.initialize().await.unwrap();
        manager.apply_session_change(Some(provider.session_for("alice@x.com").unwrap()));
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_up_with_invite() {
        let (manager, _) = manager_with(Arc::new(InMemoryIdentityProvider::new()));

        let metadata = SignUpMetadata::with_name("Bob").with_invite(" inv-42 ");
        let outcome = manager.sign_up("bob@x.com", "hunter22", metadata).await.unwrap();

        assert!(matches!(outcome, SignUpOutcome::SignedIn(ref p) if p.name == "Bob"));
        let session = manager.state().session().cloned().unwrap();
        assert_eq!(
            session.user.user_metadata.extra.get("inviteToken"),
            Some(&serde_json::Value::String("inv-42".to_string()))
        );
    }

    #[tokio::test]
    async fn test_reset_password_is_generic() {
        let provider = Arc::new(InMemoryIdentityProvider::new());
        let (manager, _) = manager_with(provider.clone());

        assert_eq!(manager.reset_password("nobody@x.com").await, Ok(RESET_EMAIL_SENT));
        assert_eq!(manager.state(), AuthState::Anonymous);

        provider.set_offline(true);
        assert!(manager.reset_password("nobody@x.com").await.unwrap_err().is_transport());
    }

    #[tokio::test]
    async fn test_initialize_restores_session() {
        let provider = provider_with_alice();
        provider.push_session(Some(provider.session_for("alice@x.com").unwrap()));
        let (manager, _) = manager_with(provider);

        let profile = manager.initialize().await.unwrap();

        assert_eq!(profile.map(|p| p.name), Some("Alice".to_string()));
        assert!(manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_initialize_without_session() {
        let (manager, _) = manager_with(Arc::new(InMemoryIdentityProvider::new()));
        assert_eq!(manager.initialize().await, Ok(None));
        assert_eq!(manager.state(), AuthState::Anonymous);
    }

    #[tokio::test]
    async fn test_update_display_name() {
        let (manager, replicator) = manager_with(provider_with_alice());
        let before = manager.sign_in("alice@x.com", "hunter22").await.unwrap();

        let after = manager.update_display_name("Alicia").await.unwrap();

        assert_eq!(after.name, "Alicia");
        assert_eq!(after.workspace.name, "Alicia's Workspace");
        assert_eq!(after.workspace_id, before.workspace_id);
        replicator.wait_for(4).await;
    }

    #[tokio::test]
    async fn test_update_display_name_requires_session() {
        let (manager, _) = manager_with(provider_with_alice());
        assert_eq!(
            manager.update_display_name("Alicia").await,
            Err(AuthError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn test_listener_follows_provider() {
        let provider = provider_with_alice();
        let (manager, _) = manager_with(provider.clone());
        let manager = Arc::new(manager);
        let listener = spawn_session_listener(manager.clone());
        let mut states = manager.subscribe();

        provider.push_session(Some(provider.session_for("alice@x.com").unwrap()));
        states.wait_for(AuthState::is_authenticated).await.unwrap();

        provider.push_session(None);
        states.wait_for(|s| *s == AuthState::Anonymous).await.unwrap();

        listener.abort();
    }

    #[tokio::test]
    async fn test_push_during_pending_request_is_ignored() {
        let provider = provider_with_alice();
        let (manager, _) = manager_with(provider.clone());
        manager.begin(Some(AuthState::Pending));

        manager.apply_session_change(Some(provider.session_for("alice@x.com").unwrap()));

        assert!(manager.is_loading());
    }

    #[tokio::test]
    async fn test_refreshed_session_keeps_profile() {
        let provider = provider_with_alice();
        let (manager, replicator) = manager_with(provider.clone());
        let profile = manager.sign_in("alice@x.com", "hunter22").await.unwrap();
        replicator.wait_for(2).await;

        let refreshed = provider.session_for("alice@x.com").unwrap();
        manager.apply_session_change(Some(refreshed.clone()));

        assert_eq!(manager.state().session(), Some(&refreshed));
        assert_eq!(manager.profile(), Some(profile));
        assert_eq!(replicator.calls().len(), 2);
    }
}
