//! Mission and autopilot state machines, COLREG collision avoidance,
//! and the PID/navigation math they're built on.

pub mod ais;
pub mod autopilot;
pub mod colreg;
pub mod marine_math;
pub mod mission;
pub mod pid;
pub mod position;
