//! # PulseHQ Shared Library
//!
//! Core of the PulseHQ workspace: domain models, the entity store, the
//! authentication session manager and the board/list interaction layer.
//! Nothing in this crate performs network I/O; remote services are reached
//! through the traits in [`auth::identity`] and [`auth::replication`].
//!
//! ## Module Organization
//!
//! - `models`: Tasks, contacts, messages, notes and team members
//! - `store`: Entity store, UI selection state and local persistence
//! - `auth`: Session lifecycle, profile derivation and authorization
//! - `board`: Drag-and-drop, search, forms and timelines

pub mod auth;
pub mod board;
pub mod models;
pub mod store;

/// Current version of the PulseHQ shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
