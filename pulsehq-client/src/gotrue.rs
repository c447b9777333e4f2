/// HTTP identity provider for the hosted auth service
///
/// Talks to the GoTrue-compatible REST API under `{url}/auth/v1`. Every
/// request carries the public key as `apikey`; calls made on behalf of a
/// signed-in user carry the access token as a bearer token.
///
/// The client keeps the current session in a `watch` channel. Every call
/// that changes the session publishes the new value, which is what
/// `SessionManager` listens to.

use async_trait::async_trait;
use chrono::Utc;
use pulsehq_shared::auth::identity::{
    AuthError, Identity, IdentityProvider, Session, SignUpMetadata, SignUpResponse, UserMetadata,
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value as JsonValue};
use std::time::Duration;
use tokio::sync::watch;

use crate::config::IdentityConfig;
use crate::error::{ClientError, ClientResult};

/// Access tokens closer than this to expiry are refreshed before use
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Body of a successful token grant
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,

    #[serde(default)]
    refresh_token: Option<String>,

    #[serde(default)]
    expires_in: Option<i64>,

    #[serde(default)]
    expires_at: Option<i64>,

    user: Identity,
}

impl TokenResponse {
    fn into_session(self, now: i64) -> Session {
        let expires_at = self.expires_at.or_else(|| self.expires_in.map(|secs| now + secs));
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

fn needs_refresh(session: &Session, now: i64) -> bool {
    session
        .expires_at
        .is_some_and(|expires_at| expires_at - REFRESH_MARGIN_SECS <= now)
}

/// Interprets a sign-up body
///
/// With auto-confirm the service answers with a full token grant. When
/// email confirmation is required it answers with the bare user object.
fn parse_sign_up(body: JsonValue, now: i64) -> Result<SignUpResponse, ClientError> {
    if body.get("access_token").is_some() {
        let session = serde_json::from_value::<TokenResponse>(body)?.into_session(now);
        Ok(SignUpResponse {
            user: session.user.clone(),
            session: Some(session),
        })
    } else {
        Ok(SignUpResponse {
            user: serde_json::from_value(body)?,
            session: None,
        })
    }
}

/// `IdentityProvider` backed by the hosted auth REST API
pub struct GoTrueClient {
    http: Client,
    base_url: String,
    api_key: String,
    session: watch::Sender<Option<Session>>,
}

impl GoTrueClient {
    /// Creates a client with its own connection pool
    pub fn new(config: &IdentityConfig, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build().map_err(ClientError::Transport)?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a client on top of an existing `reqwest::Client`
    pub fn with_client(http: Client, config: &IdentityConfig) -> Self {
        let (session, _) = watch::channel(None);
        Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            session,
        }
    }

    /// Seeds the cached session, typically one restored from disk
    pub fn restore_session(&self, session: Option<Session>) {
        self.session.send_replace(session);
    }

    /// Session currently cached, without refreshing it
    pub fn cached_session(&self) -> Option<Session> {
        self.session.borrow().clone()
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn request(&self, method: Method, path: &str, access_token: Option<&str>) -> RequestBuilder {
        self.http
            .request(method, self.endpoint(path))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token.unwrap_or(&self.api_key))
    }

    fn access_token(&self) -> Result<String, AuthError> {
        self.session
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
            .ok_or(AuthError::NotAuthenticated)
    }

    async fn execute(builder: RequestBuilder) -> ClientResult<String> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(builder: RequestBuilder) -> ClientResult<T> {
        let body = Self::execute(builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn password_grant(&self, email: &str, password: &str) -> RequestBuilder {
        self.request(Method::POST, "token", None)
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
    }

    fn sign_up_request(&self, email: &str, password: &str, metadata: &SignUpMetadata) -> RequestBuilder {
        self.request(Method::POST, "signup", None)
            .json(&json!({ "email": email, "password": password, "data": metadata }))
    }

    fn refresh_grant(&self, refresh_token: &str) -> RequestBuilder {
        self.request(Method::POST, "token", None)
            .query(&[("grant_type", "refresh_token")])
            .json(&json!({ "refresh_token": refresh_token }))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let token: TokenResponse = Self::execute_json(self.refresh_grant(refresh_token)).await?;
        Ok(token.into_session(Utc::now().timestamp()))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(session) = self.cached_session() else {
            return Ok(None);
        };
        if !needs_refresh(&session, Utc::now().timestamp()) {
            return Ok(Some(session));
        }

        let Some(refresh_token) = session.refresh_token.as_deref() else {
            tracing::debug!(user_id = %session.user.id, "Cached session expired without refresh token");
            self.session.send_replace(None);
            return Ok(None);
        };

        match self.refresh(refresh_token).await {
            Ok(fresh) => {
                tracing::debug!(user_id = %fresh.user.id, "Refreshed access token");
                self.session.send_replace(Some(fresh.clone()));
                Ok(Some(fresh))
            }
            Err(err) if err.is_transport() => Err(err),
            Err(err) => {
                tracing::warn!(error = %err, "Refresh token rejected, dropping cached session");
                self.session.send_replace(None);
                Ok(None)
            }
        }
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
        let body: JsonValue = Self::execute_json(self.sign_up_request(email, password, metadata)).await?;
        let response = parse_sign_up(body, Utc::now().timestamp())?;

        if let Some(session) = &response.session {
            self.session.send_replace(Some(session.clone()));
        }
        Ok(response)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let token: TokenResponse = Self::execute_json(self.password_grant(email, password)).await?;
        let session = token.into_session(Utc::now().timestamp());
        self.session.send_replace(Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Ok(access_token) = self.access_token() else {
            return Ok(());
        };

        let result = Self::execute(self.request(Method::POST, "logout", Some(&access_token))).await;

        // The local session is gone either way
        self.session.send_replace(None);
        result.map(|_| ()).map_err(AuthError::from)
    }

    async fn update_user_metadata(&self, metadata: &UserMetadata) -> Result<Identity, AuthError> {
        let access_token = self.access_token()?;
        let builder = self
            .request(Method::PUT, "user", Some(&access_token))
            .json(&json!({ "data": metadata }));
        let identity: Identity = Self::execute_json(builder).await?;

        self.session.send_modify(|session| {
            if let Some(session) = session {
                session.user = identity.clone();
            }
        });
        Ok(identity)
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let builder = self
            .request(Method::POST, "recover", None)
            .json(&json!({ "email": email }));
        Self::execute(builder).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoTrueClient {
        GoTrueClient::with_client(
            Client::new(),
            &IdentityConfig {
                url: "https://project.example.co/".to_string(),
                api_key: "anon-key".to_string(),
            },
        )
    }

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: "alice@x.com".to_string(),
            user_metadata: UserMetadata::default(),
            email_confirmed_at: None,
        }
    }

    fn session(expires_at: Option<i64>, refresh_token: Option<&str>) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: refresh_token.map(str::to_string),
            expires_at,
            user: identity("u1"),
        }
    }

    #[test]
    fn test_password_grant_request() {
        let request = client().password_grant("alice@x.com", "hunter22").build().unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://project.example.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(request.headers()["apikey"], "anon-key");
        assert_eq!(request.headers()["authorization"], "Bearer anon-key");

        let body: JsonValue = serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(body, json!({ "email": "alice@x.com", "password": "hunter22" }));
    }

    #[test]
    fn test_sign_up_request_carries_invite() {
        let metadata = SignUpMetadata::with_name("Bob").with_invite("inv-42");
        let request = client()
            .sign_up_request("bob@x.com", "hunter22", &metadata)
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/auth/v1/signup");
        let body: JsonValue = serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(body["email"], json!("bob@x.com"));
        assert_eq!(body["data"], json!({ "name": "Bob", "inviteToken": "inv-42" }));
    }

    #[test]
    fn test_user_requests_carry_access_token() {
        let request = client()
            .request(Method::PUT, "user", Some("user-token"))
            .build()
            .unwrap();

        assert_eq!(request.url().path(), "/auth/v1/user");
        assert_eq!(request.headers()["authorization"], "Bearer user-token");
        assert_eq!(request.headers()["apikey"], "anon-key");
    }

    #[test]
    fn test_token_response_computes_expiry() {
        let token: TokenResponse = serde_json::from_value(json!({
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "r",
            "user": { "id": "u1", "email": "alice@x.com", "aud": "authenticated" }
        }))
        .unwrap();

        let session = token.into_session(1_000);
        assert_eq!(session.expires_at, Some(4_600));
        assert_eq!(session.refresh_token.as_deref(), Some("r"));
        assert_eq!(session.user.id, "u1");
    }

    #[test]
    fn test_sign_up_bodies() {
        let confirm = parse_sign_up(
            json!({ "id": "u1", "email": "alice@x.com", "user_metadata": { "name": "Alice" } }),
            0,
        )
        .unwrap();
        assert!(confirm.session.is_none());
        assert_eq!(confirm.user.user_metadata.name.as_deref(), Some("Alice"));

        let signed_in = parse_sign_up(
            json!({
                "access_token": "a",
                "expires_at": 99,
                "user": { "id": "u1", "email": "alice@x.com" }
            }),
            0,
        )
        .unwrap();
        assert_eq!(signed_in.session.map(|s| s.expires_at), Some(Some(99)));
    }

    #[test]
    fn test_needs_refresh() {
        assert!(!needs_refresh(&session(None, None), 1_000));
        assert!(!needs_refresh(&session(Some(2_000), None), 1_000));
        assert!(needs_refresh(&session(Some(1_050), None), 1_000));
        assert!(needs_refresh(&session(Some(900), None), 1_000));
    }

    #[tokio::test]
    async fn test_current_session_without_network() {
        let client = client();
        assert_eq!(client.current_session().await.unwrap(), None);

        let fresh = session(Some(Utc::now().timestamp() + 3_600), Some("r"));
        client.restore_session(Some(fresh.clone()));
        assert_eq!(client.current_session().await.unwrap(), Some(fresh));

        // Expired and nothing to refresh with
        client.restore_session(Some(session(Some(0), None)));
        assert_eq!(client.current_session().await.unwrap(), None);
        assert!(client.cached_session().is_none());
    }

    #[tokio::test]
    async fn test_signed_out_calls() {
        let client = client();
        assert!(client.sign_out().await.is_ok());
        assert_eq!(
            client.update_user_metadata(&UserMetadata::with_name("Al")).await,
            Err(AuthError::NotAuthenticated)
        );
    }

    #[test]
    fn test_restore_notifies_subscribers() {
        let client = client();
        let mut changes = client.subscribe();

        client.restore_session(Some(session(None, None)));

        assert!(changes.has_changed().unwrap());
        assert_eq!(changes.borrow_and_update().as_ref().map(|s| s.user.id.as_str()), Some("u1"));
    }
}
