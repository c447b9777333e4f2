/// Domain models for PulseHQ
///
/// Plain records held by the [`crate::store::EntityStore`]. Each patchable
/// model comes with a `*Patch` struct of optional fields that the store merges
/// shallowly on update.
///
/// # Models
///
/// - `task`: Kanban cards (`todo` / `doing` / `done`)
/// - `contact`: CRM pipeline records (`lead` / `prospect` / `client` / `inactive`)
/// - `message`: Team chat messages
/// - `note`: Timeline notes attached to a contact or a task
/// - `user`: Team members and their workspace role
///
/// # Example
///
/// ```
/// use pulsehq_shared::models::{generate_id, task::Task};
///
/// let task = Task::new(generate_id(), "Ship release");
/// assert!(task.id.parse::<u64>().is_ok());
/// ```

pub mod contact;
pub mod message;
pub mod note;
pub mod task;
pub mod user;

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

static LAST_ISSUED_ID: AtomicU64 = AtomicU64::new(0);

/// Generates a client-side entity id
///
/// The id is the current Unix time in milliseconds, bumped past the last id
/// this process issued so two entities created in the same millisecond still
/// get distinct ids.
pub fn generate_id() -> String {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
    let mut last = LAST_ISSUED_ID.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_ISSUED_ID.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next.to_string(),
            Err(observed) => last = observed,
        }
    }
}
