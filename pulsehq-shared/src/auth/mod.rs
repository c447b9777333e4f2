/// Authentication and authorization
///
/// # Modules
///
/// - [`identity`]: Remote identity service boundary and its error type
/// - [`profile`]: Profile and workspace derivation from identity claims
/// - [`replication`]: Best-effort upsert of workspace and profile records
/// - [`session`]: Session lifecycle state machine
/// - [`authorization`]: Role-based permission checks
/// - [`memory`]: In-process identity provider
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use pulsehq_shared::auth::{
///     memory::InMemoryIdentityProvider,
///     replication::NoopReplicator,
///     session::{spawn_session_listener, SessionManager},
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let manager = Arc::new(SessionManager::new(
///     Arc::new(InMemoryIdentityProvider::new()),
///     Arc::new(NoopReplicator),
/// ));
/// let _listener = spawn_session_listener(manager.clone());
///
/// manager.initialize().await?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod identity;
pub mod memory;
pub mod profile;
pub mod replication;
pub mod session;
