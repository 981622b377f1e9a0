//! Wires the mission and autopilot state machines from `auv_autopilot` to
//! a `Transport`, draining the per-topic inboxes every tick and
//! publishing reports/actuator commands on the way out.
//!
//! The binary entry point lives in `main.rs`; this crate root only
//! exposes the pieces a test or an alternate binary needs to drive the
//! loop directly.

pub mod cycle;

pub use cycle::ControlLoop;
