//! The `Transport` trait boundary and the per-topic ingest primitives
//! built on top of it.
//!
//! The control core never talks to a wire format or a message bus
//! directly — it reads and writes through strongly typed handles that a
//! concrete `Transport` implementation produces. `auv_transport::Loopback`
//! is the one shipped implementation; a networked transport (MQTT/gRPC/
//! DDS) is out of scope here and left to a deployer.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::TransportError;

/// Logical channel names, shared between a `Transport` implementation and
/// the control loop so both sides agree on what `publish`/subscribe calls
/// mean without hard-coding strings at each call site. Consumed-topic
/// ingest is wired through [`Inbox`]/[`LatestInbox`] directly rather than
/// through the `Transport` trait (see module docs); these names only need
/// to line up on the publish side, but are listed together here since
/// spec.md §6 enumerates consumed and produced channels as one table.
pub mod topics {
    pub const ROUTE: &str = "route";
    pub const LOITER_POSITION: &str = "loiter_position";
    pub const DIVE_PROCEDURE: &str = "dive_procedure";
    pub const MISSION: &str = "mission";
    pub const MISSION_COMMAND: &str = "mission_command";
    pub const AUTOPILOT_COMMAND: &str = "autopilot_command";
    pub const PROCEDURE_ACTIVATION: &str = "procedure_activation";
    pub const SENSORS: &str = "sensors";
    pub const AIS: &str = "ais";

    pub const ACTUATOR_COMMAND: &str = "actuator_command";
    pub const AP_REPORT: &str = "ap_report";
    pub const MISSION_REPORT: &str = "mission_report";
    pub const COLREG_STATUS: &str = "colreg_status";
}

/// FIFO inbox for topics where every message matters and order is
/// significant (mission commands, AP commands, procedure activations).
/// Nothing is ever dropped except by explicit `drain`.
pub struct Inbox<T> {
    queue: Arc<Mutex<VecDeque<T>>>,
}

impl<T> Inbox<T> {
    pub fn new() -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn push(&self, item: T) {
        self.queue.lock().push_back(item);
    }

    /// Pop the oldest unread message, if any.
    pub fn pop(&self) -> Option<T> {
        self.queue.lock().pop_front()
    }

    /// Drain every pending message, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.queue.lock().drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}

impl<T> Default for Inbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Inbox<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
        }
    }
}

/// Last-writer-wins inbox for topics where only the freshest value
/// matters (sensor reports, AIS fixes keyed by mmsi outside this type).
pub struct LatestInbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T: Clone> LatestInbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set(&self, item: T) {
        *self.slot.lock() = Some(item);
    }

    /// Read the latest value without consuming it.
    pub fn peek(&self) -> Option<T> {
        self.slot.lock().clone()
    }

    /// Read and clear the latest value.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}

impl<T: Clone> Default for LatestInbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for LatestInbox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

/// A pluggable pub/sub boundary. A control loop publishes reports and
/// actuator commands, and subscribes to the topics it ingests, entirely
/// through this trait — it never knows whether the backing bus is
/// in-process, MQTT, gRPC, or DDS.
pub trait Transport: Send + Sync {
    /// Publish a pre-serialized payload on `topic`. Implementations may
    /// serialize however suits their wire format; the control loop hands
    /// over already-encoded bytes.
    fn publish(&self, topic: &'static str, payload: &[u8]) -> Result<(), TransportError>;

    /// True once the expected peer (operator/C2 station) has a live
    /// subscription match. Used for the startup connection wait and to
    /// detect clean disconnect.
    fn peer_connected(&self) -> bool;
}
