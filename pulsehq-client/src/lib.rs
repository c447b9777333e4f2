//! # PulseHQ Client Library
//!
//! Process-level pieces of the PulseHQ client: configuration, HTTP
//! implementations of the identity and replication boundaries, and the
//! wiring that restores local state and the previous session on startup.
//!
//! ## Modules
//!
//! - `app`: Startup, sign-in flows and persistence
//! - `config`: Configuration management
//! - `error`: HTTP error type and mapping into auth/replication errors
//! - `gotrue`: Identity provider over the hosted auth REST API
//! - `rest`: Profile replication over the hosted data REST API

pub mod app;
pub mod config;
pub mod error;
pub mod gotrue;
pub mod rest;
