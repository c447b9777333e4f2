/// Configuration management for the PulseHQ client
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `PULSEHQ_AUTH_URL`: Base URL of the identity/data service (required)
/// - `PULSEHQ_AUTH_KEY`: Public API key of the service (required)
/// - `PULSEHQ_STATE_DIR`: Directory for persisted state (default: .pulsehq)
/// - `PULSEHQ_SEED_DEMO`: Load the demo workspace after sign-in (default: true)
/// - `PULSEHQ_HTTP_TIMEOUT_SECS`: Request timeout (default: 10)
/// - `RUST_LOG`: Log filter (default: pulsehq_client=debug,pulsehq_shared=info)
///
/// # Example
///
/// ```no_run
/// use pulsehq_client::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Identity service at {}", config.identity.url);
/// # Ok(())
/// # }
/// ```

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity and data service connection
    pub identity: IdentityConfig,

    /// Local persistence
    pub storage: StorageConfig,

    /// Outgoing HTTP settings
    pub http: HttpConfig,

    /// Load the demo workspace after sign-in
    pub seed_demo: bool,
}

/// Identity service configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Service base URL without trailing slash, e.g. `https://project.example.co`
    pub url: String,

    /// Public (anonymous) API key sent as `apikey`
    pub api_key: String,
}

impl std::fmt::Debug for IdentityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `pulsehq-storage.json`
    pub state_dir: PathBuf,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_flag(name: &str, value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{name} must be true or false, got {other:?}"),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `PULSEHQ_AUTH_URL` or `PULSEHQ_AUTH_KEY` is missing
    /// - The URL is not an absolute http(s) URL
    /// - A numeric or boolean variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_url = lookup("PULSEHQ_AUTH_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("PULSEHQ_AUTH_URL environment variable is required"))?;

        let url = Url::parse(raw_url.trim())
            .map_err(|e| anyhow::anyhow!("PULSEHQ_AUTH_URL is not a valid URL: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("PULSEHQ_AUTH_URL must use http or https");
        }

        let api_key = lookup("PULSEHQ_AUTH_KEY")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("PULSEHQ_AUTH_KEY environment variable is required"))?;

        let state_dir = lookup("PULSEHQ_STATE_DIR").unwrap_or_else(|| ".pulsehq".to_string());

        let seed_demo = match lookup("PULSEHQ_SEED_DEMO") {
            Some(value) => parse_flag("PULSEHQ_SEED_DEMO", &value)?,
            None => true,
        };

        let timeout_secs = lookup("PULSEHQ_HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u64>()?;

        Ok(Self {
            identity: IdentityConfig {
                url: url.as_str().trim_end_matches('/').to_string(),
                api_key: api_key.trim().to_string(),
            },
            storage: StorageConfig {
                state_dir: PathBuf::from(state_dir),
            },
            http: HttpConfig { timeout_secs },
            seed_demo,
        })
    }
}
