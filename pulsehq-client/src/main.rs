//! # PulseHQ Client
//!
//! Restores the local workspace and any previous session, then keeps the
//! session in sync with the identity service until interrupted. State is
//! written back to disk on shutdown.
//!
//! ## Usage
//!
//! ```bash
//! PULSEHQ_AUTH_URL=https://project.example.co PULSEHQ_AUTH_KEY=... cargo run -p pulsehq-client
//! ```

use pulsehq_client::{app::App, config::Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulsehq_client=debug,pulsehq_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("PulseHQ client v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::debug!(?config, "Loaded configuration");

    let app = App::bootstrap(config).await?;

    match app.session().profile() {
        Some(profile) => tracing::info!(
            user_id = %profile.id,
            workspace = %profile.workspace.name,
            tasks = app.store().tasks().len(),
            contacts = app.store().contacts().len(),
            "Session restored"
        ),
        None => tracing::info!("Not signed in"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, saving state...");

    app.shutdown()?;

    Ok(())
}
