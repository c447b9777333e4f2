/// Error handling for the HTTP clients
///
/// Every outgoing request returns `ClientResult<T>`. The boundary traits in
/// `pulsehq_shared` speak their own error types, so this module also maps a
/// `ClientError` into `AuthError` (identity calls) and `ReplicationError`
/// (profile and workspace upserts).
///
/// # Example
///
/// ```
/// use pulsehq_client::error::ClientError;
/// use pulsehq_shared::auth::identity::AuthError;
///
/// let err = ClientError::Status {
///     status: 400,
///     body: r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.to_string(),
/// };
/// assert_eq!(AuthError::from(err), AuthError::InvalidCredentials);
/// ```

use pulsehq_shared::auth::identity::AuthError;
use pulsehq_shared::auth::replication::ReplicationError;
use serde::Deserialize;
use std::fmt;

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure of one HTTP exchange
#[derive(Debug)]
pub enum ClientError {
    /// The request never produced a response (DNS, connect, timeout, TLS)
    Transport(reqwest::Error),

    /// The service answered with a non-success status
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    Decode(String),
}

/// Error body returned by the identity and data services
///
/// The services are not consistent about field names: token errors use
/// `error` / `error_description`, newer endpoints use `error_code` / `msg`,
/// and the data API uses `code` / `message`.
#[derive(Debug, Default, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub error_description: Option<String>,

    #[serde(default)]
    pub error_code: Option<String>,

    #[serde(default)]
    pub msg: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    /// Parses a response body, tolerating non-JSON bodies
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    /// Machine-readable code, if the service sent one
    pub fn code(&self) -> Option<&str> {
        self.error_code.as_deref().or(self.error.as_deref())
    }

    /// Human-readable message, if the service sent one
    pub fn message(&self) -> Option<&str> {
        self.error_description
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.message.as_deref())
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Transport(err) => write!(f, "Request failed: {}", err),
            ClientError::Status { status, body } => write!(f, "Service returned {}: {}", status, body),
            ClientError::Decode(msg) => write!(f, "Invalid response body: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

/// Classifies an identity service rejection
pub fn auth_error_from_status(status: u16, raw_body: &str) -> AuthError {
    if status == 429 {
        return AuthError::RateLimited;
    }

    let body = ServiceErrorBody::parse(raw_body);
    let code = body.code().unwrap_or_default();
    let message = body.message().unwrap_or_default();
    let lowered = message.to_lowercase();

    if code == "invalid_credentials" || lowered.contains("invalid login credentials") {
        return AuthError::InvalidCredentials;
    }
    if code == "email_not_confirmed" || lowered.contains("email not confirmed") {
        return AuthError::EmailNotConfirmed;
    }
    if code == "user_already_exists" || code == "email_exists" || lowered.contains("already registered") {
        return AuthError::UserAlreadyExists;
    }
    if code == "over_request_rate_limit" || code == "over_email_send_rate_limit" {
        return AuthError::RateLimited;
    }

    let message = if message.is_empty() {
        format!("Request failed with status {}", status)
    } else {
        message.to_string()
    };
    AuthError::Provider {
        status: Some(status),
        message,
    }
}

impl From<ClientError> for AuthError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(err) => AuthError::Network(err.to_string()),
            ClientError::Status { status, body } => auth_error_from_status(status, &body),
            ClientError::Decode(msg) => AuthError::Provider { status: None, message: msg },
        }
    }
}

impl From<ClientError> for ReplicationError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Transport(err) => ReplicationError::Network(err.to_string()),
            ClientError::Status { status, body } => {
                let parsed = ServiceErrorBody::parse(&body);
                ReplicationError::Rejected {
                    status,
                    message: parsed.message().map(str::to_string).unwrap_or(body),
                }
            }
            ClientError::Decode(msg) => ReplicationError::Rejected { status: 0, message: msg },
        }
    }
}
