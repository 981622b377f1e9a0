//! Error taxonomy for ingest and transport boundaries.
//!
//! Anything that reaches the control loop as malformed data or a
//! publish/subscribe failure surfaces here; missing-prerequisite and
//! out-of-range conditions inside the autopilot itself are not errors —
//! they are `None`/clamped values, matching the source's silent-skip
//! behavior (see SPEC_FULL.md §7).

use thiserror::Error;

/// Rejected at the ingest boundary before ever reaching the autopilot.
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("route {id} has no waypoints")]
    EmptyRoute { id: i64 },

    #[error("mission {id} has no items")]
    EmptyMission { id: i64 },

    #[error("dive procedure {id} has negative depth {depth}")]
    NegativeDepth { id: i64, depth: f64 },
}

/// Publish/subscribe failures from a [`crate::transport::Transport`]
/// implementation. The control loop logs these and continues; it never
/// retries mid-tick.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to publish on topic {topic}: {reason}")]
    PublishFailed { topic: &'static str, reason: String },

    #[error("subscription to topic {topic} closed unexpectedly")]
    SubscriptionClosed { topic: &'static str },
}

/// Configuration load/parse failures, surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
