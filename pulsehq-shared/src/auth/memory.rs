/// In-process identity provider
///
/// Implements [`IdentityProvider`] against a map of accounts held in memory.
/// Used by tests and by the client when no identity service is configured.
/// Behaviour toggles simulate the failure modes of a hosted service:
///
/// - `require_confirmation`: sign-up returns no session and sign-in fails
///   with `EmailNotConfirmed` until [`InMemoryIdentityProvider::confirm_email`]
/// - `set_offline`: every call fails with a network error
/// - `set_fail_sign_out`: only sign-out fails
/// - `set_latency`: every call sleeps first

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;

use super::identity::{
    AuthError, Identity, IdentityProvider, Session, SignUpMetadata, SignUpResponse, UserMetadata,
};
use crate::models::generate_id;

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

/// Identity provider backed by process memory
#[derive(Debug)]
pub struct InMemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: watch::Sender<Option<Session>>,
    require_confirmation: bool,
    offline: AtomicBool,
    fail_sign_out: AtomicBool,
    latency_ms: AtomicU64,
    tokens_issued: AtomicU64,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session,
            require_confirmation: false,
            offline: AtomicBool::new(false),
            fail_sign_out: AtomicBool::new(false),
            latency_ms: AtomicU64::new(0),
            tokens_issued: AtomicU64::new(0),
        }
    }

    /// Provider that withholds sessions until the email is confirmed
    pub fn require_confirmation() -> Self {
        Self {
            require_confirmation: true,
            ..Self::new()
        }
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_fail_sign_out(&self, fail: bool) {
        self.fail_sign_out.store(fail, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Registers an account directly, already confirmed
    pub fn register(&self, email: &str, password: &str, name: Option<&str>) -> Result<Identity, AuthError> {
        let identity = Identity {
            id: format!("user_{}", generate_id()),
            email: email.to_string(),
            user_metadata: UserMetadata {
                name: name.map(str::to_string),
                ..Default::default()
            },
            email_confirmed_at: Some(Utc::now()),
        };
        self.insert(email, password, identity.clone())?;
        Ok(identity)
    }

    /// Marks an account's email as confirmed
    pub fn confirm_email(&self, email: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts()?;
        let account = accounts
            .get_mut(&normalize(email))
            .ok_or(AuthError::InvalidCredentials)?;
        account.identity.email_confirmed_at = Some(Utc::now());
        Ok(())
    }

    /// Replaces the held session, as a remote sign-in or token refresh would
    pub fn push_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    /// Issues a session for an existing account without checking a password
    pub fn session_for(&self, email: &str) -> Result<Session, AuthError> {
        let identity = self
            .accounts()?
            .get(&normalize(email))
            .map(|account| account.identity.clone())
            .ok_or(AuthError::InvalidCredentials)?;
        Ok(self.issue(identity))
    }

    fn accounts(&self) -> Result<MutexGuard<'_, HashMap<String, Account>>, AuthError> {
        self.accounts.lock().map_err(|_| AuthError::Provider {
            status: None,
            message: "account table lock poisoned".to_string(),
        })
    }

    fn insert(&self, email: &str, password: &str, identity: Identity) -> Result<(), AuthError> {
        let mut accounts = self.accounts()?;
        let key = normalize(email);
        if accounts.contains_key(&key) {
            return Err(AuthError::UserAlreadyExists);
        }
        accounts.insert(
            key,
            Account {
                identity,
                password: password.to_string(),
            },
        );
        Ok(())
    }

    fn issue(&self, identity: Identity) -> Session {
        let n = self.tokens_issued.fetch_add(1, Ordering::SeqCst) + 1;
        Session {
            access_token: format!("access-{}-{n}", identity.id),
            refresh_token: Some(format!("refresh-{}-{n}", identity.id)),
            expires_at: Some(Utc::now().timestamp() + 3600),
            user: identity,
        }
    }

    async fn round_trip(&self) -> Result<(), AuthError> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(AuthError::Network("identity service unreachable".to_string()));
        }
        Ok(())
    }
}

/// Stores sign-up data the way the hosted service does: every submitted key
/// ends up in the identity's metadata
fn metadata_from_sign_up(metadata: &SignUpMetadata) -> UserMetadata {
    let mut stored = UserMetadata {
        name: metadata.name.clone(),
        ..Default::default()
    };
    if let Some(token) = &metadata.invite_token {
        stored.extra.insert("inviteToken".to_string(), JsonValue::String(token.clone()));
    }
    stored
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.round_trip().await?;
        Ok(self.session.borrow().clone())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResponse, AuthError> {
        self.round_trip().await?;

        let identity = Identity {
            id: format!("user_{}", generate_id()),
            email: email.trim().to_string(),
            user_metadata: metadata_from_sign_up(metadata),
            email_confirmed_at: (!self.require_confirmation).then(Utc::now),
        };
        self.insert(email, password, identity.clone())?;

        if self.require_confirmation {
            return Ok(SignUpResponse {
                user: identity,
                session: None,
            });
        }

        let session = self.issue(identity.clone());
        self.session.send_replace(Some(session.clone()));
        Ok(SignUpResponse {
            user: identity,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.round_trip().await?;

        let identity = {
            let accounts = self.accounts()?;
            let account = accounts
                .get(&normalize(email))
                .filter(|account| account.password == password)
                .ok_or(AuthError::InvalidCredentials)?;
            account.identity.clone()
        };

        if identity.email_confirmed_at.is_none() {
            return Err(AuthError::EmailNotConfirmed);
        }

        let session = self.issue(identity);
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.round_trip().await;

        // The held session is dropped even when the remote call fails
        self.session.send_replace(None);
        result?;

        if self.fail_sign_out.load(Ordering::SeqCst) {
            return Err(AuthError::Provider {
                status: Some(500),
                message: "sign-out failed".to_string(),
            });
        }
        Ok(())
    }

    async fn update_user_metadata(&self, metadata: &UserMetadata) -> Result<Identity, AuthError> {
        self.round_trip().await?;

        let mut session = self.session.borrow().clone().ok_or(AuthError::NotAuthenticated)?;

        let identity = {
            let mut accounts = self.accounts()?;
            let account = accounts
                .get_mut(&normalize(&session.user.email))
                .ok_or(AuthError::NotAuthenticated)?;
            let current = &mut account.identity.user_metadata;
            if metadata.name.is_some() {
                current.name = metadata.name.clone();
            }
            if metadata.full_name.is_some() {
                current.full_name = metadata.full_name.clone();
            }
            current.extra.extend(metadata.extra.clone());
            account.identity.clone()
        };

        session.user = identity.clone();
        self.session.send_replace(Some(session));
        Ok(identity)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.round_trip().await?;
        // Unknown addresses succeed too; the service never reveals which emails exist
        tracing::debug!(email = %normalize(email), "Password reset requested");
        Ok(())
    }
}
