//! Autonomous Vessel Control — Common Library
//!
//! Shared types, configuration loading, error taxonomy, and the
//! `Transport` trait boundary used by all crates in the vessel control
//! core workspace.
//!
//! # Module Structure
//!
//! - [`types`] - Wire-level data model (routes, sensors, reports, ...)
//! - [`config`] - TOML configuration loading and per-channel tunings
//! - [`error`] - Ingest/transport error taxonomy
//! - [`transport`] - `Transport` trait, `Inbox`/`LatestInbox` primitives
//! - [`validate`] - Ingest-boundary validation (empty routes/missions, ...)
//! - [`prelude`] - Common re-exports for convenience

pub mod config;
pub mod error;
pub mod prelude;
pub mod transport;
pub mod types;
pub mod validate;
