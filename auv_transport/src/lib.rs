//! In-process loopback `Transport` implementation, built on
//! `std::sync::mpsc` plus `auv_common::transport`'s `Inbox`/`LatestInbox`
//! primitives.
//!
//! This is the one shipped `Transport` impl (spec.md §1: the pub/sub
//! transport and wire serialization are out of scope for the core and
//! pluggable). It is sufficient to drive the control-loop binary and
//! integration tests end to end; wiring a networked transport (MQTT/
//! gRPC/DDS) is left to a deployer as a second `Transport` impl.
//!
//! [`IngestChannels`] bundles the per-topic inboxes the control loop
//! drains every tick (spec.md §5): FIFO for anything where every message
//! matters (routes, procedures, AP/mission commands, AIS batches),
//! last-writer-wins for sensor reports and the mission spec itself (a
//! new `Mission` always replaces the prior one wholesale, so only the
//! latest matters). A producer — a test, or a transport-owned ingress
//! thread decoding wire messages — pushes into these directly; they are
//! not part of the `Transport` trait itself, which only covers the
//! publish/peer-liveness boundary.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use auv_common::error::TransportError;
use auv_common::transport::{topics, Inbox, LatestInbox, Transport};
use auv_common::types::{
    AisFix, AutopilotCommand, DiveProcedure, LoiterPosition, Mission, MissionCommand,
    ProcedureActivation, Route, SensorReport,
};

/// Every inbound topic the control loop drains at the top of each tick.
#[derive(Clone, Default)]
pub struct IngestChannels {
    pub routes: Inbox<Route>,
    pub loiter_positions: Inbox<LoiterPosition>,
    pub dive_procedures: Inbox<DiveProcedure>,
    pub missions: LatestInbox<Mission>,
    pub mission_commands: Inbox<MissionCommand>,
    pub autopilot_commands: Inbox<AutopilotCommand>,
    pub procedure_activations: Inbox<ProcedureActivation>,
    pub sensors: LatestInbox<SensorReport>,
    /// FIFO of AIVDM-derived batches — each queued message is one batch
    /// of simultaneously-reported fixes, matching spec.md §4.3/§6.
    pub ais: Inbox<Vec<AisFix>>,
}

impl IngestChannels {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One message published on the outbound side: `(topic, encoded payload)`.
pub type PublishedMessage = (&'static str, Vec<u8>);

/// Loopback `Transport`: publishes go out over an `mpsc` channel a
/// [`LoopbackSink`] drains; `peer_connected` mirrors a flag a
/// [`LoopbackPeer`] flips, standing in for a real operator/C2 station's
/// subscription coming and going.
pub struct Loopback {
    sender: mpsc::Sender<PublishedMessage>,
    peer_connected: Arc<AtomicBool>,
}

/// The downstream side of a [`Loopback`]: drains published reports and
/// actuator commands, as a telemetry sink or a test assertion would.
pub struct LoopbackSink {
    receiver: mpsc::Receiver<PublishedMessage>,
}

/// Stands in for the remote operator/C2 station: its presence flips
/// `Transport::peer_connected`, gating the control loop's startup wait
/// and clean-shutdown-on-disconnect (spec.md §4.12).
pub struct LoopbackPeer {
    peer_connected: Arc<AtomicBool>,
}

impl Loopback {
    /// Build a connected trio: the `Transport` handle the control loop
    /// owns, the sink a telemetry consumer drains, and the peer handle
    /// that simulates an operator/C2 connection.
    pub fn new() -> (Self, LoopbackSink, LoopbackPeer) {
        let (sender, receiver) = mpsc::channel();
        let peer_connected = Arc::new(AtomicBool::new(false));
        (
            Self {
                sender,
                peer_connected: Arc::clone(&peer_connected),
            },
            LoopbackSink { receiver },
            LoopbackPeer { peer_connected },
        )
    }
}

impl Transport for Loopback {
    fn publish(&self, topic: &'static str, payload: &[u8]) -> Result<(), TransportError> {
        self.sender
            .send((topic, payload.to_vec()))
            .map_err(|_| TransportError::PublishFailed {
                topic,
                reason: "loopback sink dropped".to_string(),
            })
    }

    fn peer_connected(&self) -> bool {
        self.peer_connected.load(Ordering::Acquire)
    }
}

impl LoopbackPeer {
    /// Mark the peer as connected — the control loop's startup wait
    /// (spec.md §4.12) unblocks as soon as this is observed.
    pub fn connect(&self) {
        tracing::debug!("loopback peer connected");
        self.peer_connected.store(true, Ordering::Release);
    }

    /// Mark the peer as disconnected — the control loop exits cleanly at
    /// the next tick boundary once it notices.
    pub fn disconnect(&self) {
        tracing::debug!("loopback peer disconnected");
        self.peer_connected.store(false, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.peer_connected.load(Ordering::Acquire)
    }
}

impl LoopbackSink {
    /// Drain every message published since the last call, oldest first.
    /// Never blocks.
    pub fn drain(&self) -> Vec<PublishedMessage> {
        self.receiver.try_iter().collect()
    }

    /// Block until either a message arrives or `timeout` elapses.
    pub fn recv_timeout(&self, timeout: std::time::Duration) -> Option<PublishedMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

/// Filter a drained batch down to one topic's raw payloads, in order.
pub fn payloads_for<'a>(
    messages: &'a [PublishedMessage],
    topic: &str,
) -> impl Iterator<Item = &'a [u8]> {
    messages
        .iter()
        .filter(move |(t, _)| *t == topic)
        .map(|(_, payload)| payload.as_slice())
}

/// Re-exported topic names so callers don't need a second `use` against
/// `auv_common::transport::topics` just to match on a drained message.
pub use auv_common::transport::topics as topic_names;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn publish_reaches_sink() {
        let (transport, sink, _peer) = Loopback::new();
        transport.publish(topics::ACTUATOR_COMMAND, b"hello").unwrap();
        let drained = sink.drain();
        assert_eq!(drained, vec![(topics::ACTUATOR_COMMAND, b"hello".to_vec())]);
    }

    #[test]
    fn peer_starts_disconnected() {
        let (transport, _sink, _peer) = Loopback::new();
        assert!(!transport.peer_connected());
    }

    #[test]
    fn peer_connect_and_disconnect_observed_by_transport() {
        let (transport, _sink, peer) = Loopback::new();
        peer.connect();
        assert!(transport.peer_connected());
        peer.disconnect();
        assert!(!transport.peer_connected());
    }

    #[test]
    fn publish_after_sink_dropped_is_an_error() {
        let (transport, sink, _peer) = Loopback::new();
        drop(sink);
        assert!(transport.publish(topics::AP_REPORT, b"x").is_err());
    }

    #[test]
    fn recv_timeout_returns_none_when_idle() {
        let (_transport, sink, _peer) = Loopback::new();
        assert!(sink.recv_timeout(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn ingest_channels_drain_in_fifo_order() {
        let channels = IngestChannels::new();
        channels.mission_commands.push(MissionCommand::Start);
        channels.mission_commands.push(MissionCommand::Suspend);
        let drained = channels.mission_commands.drain();
        assert_eq!(drained, vec![MissionCommand::Start, MissionCommand::Suspend]);
    }

    #[test]
    fn sensors_inbox_keeps_only_latest() {
        let channels = IngestChannels::new();
        let sensors_a = sensors_with_sog(1.0);
        let sensors_b = sensors_with_sog(2.0);
        channels.sensors.set(sensors_a);
        channels.sensors.set(sensors_b);
        assert_eq!(channels.sensors.take().unwrap().sog, 2.0);
        assert!(channels.sensors.take().is_none());
    }

    fn sensors_with_sog(sog: f64) -> SensorReport {
        SensorReport {
            heading: 0.0,
            cog: 0.0,
            sog,
            speed: sog,
            rate_of_turn: 0.0,
            rudder_angle: 0.0,
            port_rpm: 0.0,
            stbd_rpm: 0.0,
            port_throttle: 0.0,
            stbd_throttle: 0.0,
            depth_under_keel: 100.0,
            ship_depth: 0.0,
            buoyancy: 1.0,
            gnss_1: auv_common::types::Coordinates::ZERO,
            gnss_2: auv_common::types::Coordinates::ZERO,
            gnss_3: auv_common::types::Coordinates::ZERO,
        }
    }
}
