/// Remote identity service boundary
///
/// The session manager talks to the hosted identity service only through the
/// [`IdentityProvider`] trait. Any provider implementing these seven
/// operations can be substituted:
///
/// 1. `current_session` - get the current session
/// 2. `subscribe` - session-change events
/// 3. `sign_up` - create an identity with email/password and metadata
/// 4. `sign_in` - email/password sign-in
/// 5. `sign_out`
/// 6. `update_user_metadata`
/// 7. `send_password_reset`
///
/// # Example
///
/// ```no_run
/// use pulsehq_shared::auth::identity::{IdentityProvider, AuthError};
///
/// # async fn example(provider: &dyn IdentityProvider) -> Result<(), AuthError> {
/// let session = provider.sign_in("alice@example.com", "hunter22").await?;
/// println!("Signed in as {}", session.user.email);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::watch;

/// Error type for identity operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Wrong email or password
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// The identity exists but its email is not confirmed yet
    #[error("Email not confirmed")]
    EmailNotConfirmed,

    /// Sign-up with an email that is already registered
    #[error("User already registered")]
    UserAlreadyExists,

    /// The service throttled the request
    #[error("Too many requests")]
    RateLimited,

    /// The service could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Any other error reported by the service
    #[error("Identity service error ({status:?}): {message}")]
    Provider {
        status: Option<u16>,
        message: String,
    },

    /// The operation needs a signed-in identity
    #[error("Not signed in")]
    NotAuthenticated,

    /// A newer auth operation started before this one settled; its result
    /// was discarded
    #[error("Superseded by a newer authentication request")]
    Superseded,
}

impl AuthError {
    /// Whether the failure happened at the transport level
    pub fn is_transport(&self) -> bool {
        matches!(self, AuthError::Network(_))
    }

    /// Message shown inline in the auth form
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials => {
                "Invalid email or password. Please check your credentials and try again.".to_string()
            }
            AuthError::EmailNotConfirmed => {
                "Please check your email and click the confirmation link before signing in.".to_string()
            }
            AuthError::UserAlreadyExists => {
                "An account with this email already exists. Please sign in instead.".to_string()
            }
            AuthError::RateLimited => "Too many attempts. Please wait a moment and try again.".to_string(),
            AuthError::Network(_) => {
                "Unable to reach the server. Please check your connection and try again.".to_string()
            }
            AuthError::Provider { message, .. } => message.clone(),
            AuthError::NotAuthenticated => "Please sign in to continue.".to_string(),
            AuthError::Superseded => "This request was replaced by a newer one.".to_string(),
        }
    }
}

/// Free-form metadata stored on the identity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Any other keys the service returns
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl UserMetadata {
    /// Metadata carrying only a display name
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Authenticated identity claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity id assigned by the service
    pub id: String,

    pub email: String,

    #[serde(default)]
    pub user_metadata: UserMetadata,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

/// Active session issued by the identity service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Unix timestamp the access token expires at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,

    pub user: Identity,
}

/// Metadata submitted with a sign-up
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignUpMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Invitation token when joining an existing workspace
    #[serde(default, rename = "inviteToken", skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
}

impl SignUpMetadata {
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Attaches the token of the invitation being accepted
    pub fn with_invite(mut self, token: impl Into<String>) -> Self {
        self.invite_token = Some(token.into());
        self
    }

    /// Trims both fields and drops the blank ones
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        Self {
            name: clean(self.name),
            invite_token: clean(self.invite_token),
        }
    }
}

/// Result of a sign-up call
///
/// `session` is `None` when the service requires email confirmation before
/// it issues a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpResponse {
    pub user: Identity,
    pub session: Option<Session>,
}

/// Capability interface of the remote identity service
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Returns the session the provider currently holds, if any
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;

    /// Session-change events; the receiver always holds the latest session
    fn subscribe(&self) -> watch::Receiver<Option<Session>>;

    /// Creates an identity
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpResponse, AuthError>;

    /// Checks credentials and opens a session
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Ends the current session
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Merges `metadata` into the signed-in identity's metadata
    async fn update_user_metadata(&self, metadata: &UserMetadata) -> Result<Identity, AuthError>;

    /// Sends a password-reset email
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_keeps_unknown_keys() {
        let metadata: UserMetadata =
            serde_json::from_str(r#"{"name":"Alice","avatar_url":"https://x/a.png"}"#).unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Alice"));
        assert_eq!(metadata.extra["avatar_url"], "https://x/a.png");

        let back = serde_json::to_value(&metadata).unwrap();
        assert_eq!(back["avatar_url"], "https://x/a.png");
        assert!(back.get("full_name").is_none());
    }

    #[test]
    fn test_identity_without_metadata() {
        let identity: Identity =
            serde_json::from_str(r#"{"id":"u1","email":"alice@x.com"}"#).unwrap();
        assert_eq!(identity.user_metadata, UserMetadata::default());
    }

    #[test]
    fn test_only_network_errors_are_transport() {
        assert!(AuthError::Network("timeout".to_string()).is_transport());
        assert!(!AuthError::InvalidCredentials.is_transport());
        assert!(!AuthError::Provider {
            status: Some(500),
            message: "boom".to_string()
        }
        .is_transport());
    }

    #[test]
    fn test_user_messages() {
        assert!(AuthError::InvalidCredentials.user_message().contains("Invalid email or password"));
        assert!(AuthError::EmailNotConfirmed.user_message().contains("check your email"));
        let provider = AuthError::Provider {
            status: Some(400),
            message: "Signup is disabled".to_string(),
        };
        assert_eq!(provider.user_message(), "Signup is disabled");
    }

    #[test]
    fn test_sign_up_metadata_wire_shape() {
        let metadata = SignUpMetadata::with_name("  Bob ").with_invite("inv-42").normalized();
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            serde_json::json!({ "name": "Bob", "inviteToken": "inv-42" })
        );

        let blank = SignUpMetadata::with_name("   ").with_invite("").normalized();
        assert_eq!(blank, SignUpMetadata::default());
    }
}
