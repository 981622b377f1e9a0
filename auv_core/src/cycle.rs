//! The control loop itself: per-tick ingest, mission/autopilot
//! dispatch, and report/actuator publish.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use auv_autopilot::autopilot::AutopilotCore;
use auv_autopilot::mission::MissionController;
use auv_common::config::AutopilotConfig;
use auv_common::transport::{topics, Transport};
use auv_common::types::MissionCommand;
use auv_common::validate::{validate_dive_procedure, validate_mission, validate_route};
use auv_transport::IngestChannels;

/// Owns the mission/autopilot state and drives them against an
/// `IngestChannels`/`Transport` pair at a fixed tick cadence.
pub struct ControlLoop<T: Transport> {
    transport: T,
    channels: IngestChannels,
    autopilot: AutopilotCore,
    mission: MissionController,
    tick_period: Duration,
    running: Arc<AtomicBool>,
    started_at: Option<Instant>,
}

impl<T: Transport> ControlLoop<T> {
    pub fn new(transport: T, channels: IngestChannels, config: AutopilotConfig) -> Self {
        let tick_period = config.tick_period;
        Self {
            transport,
            channels,
            autopilot: AutopilotCore::new(config),
            mission: MissionController::new(),
            tick_period,
            running: Arc::new(AtomicBool::new(true)),
            started_at: None,
        }
    }

    /// A clone of the running flag, for wiring to a Ctrl-C handler.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Block until the transport observes its peer, polling every
    /// `poll_interval`. Returns `false` if `timeout` elapses first.
    pub fn wait_for_peer(&self, timeout: Duration, poll_interval: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.transport.peer_connected() {
                return true;
            }
            if Instant::now() >= deadline {
                return self.transport.peer_connected();
            }
            std::thread::sleep(poll_interval);
        }
    }

    fn elapsed_secs(&mut self) -> f64 {
        let started = *self.started_at.get_or_insert_with(Instant::now);
        started.elapsed().as_secs_f64()
    }

    /// Run one tick at monotonic time `now` (seconds since the loop
    /// started). Exposed directly so tests can drive it without
    /// sleeping or depending on wall-clock timing.
    pub fn tick(&mut self, now: f64) {
        self.ingest(now);
        self.mission.run(&mut self.autopilot, now);

        let actuators_ready = self.autopilot.execute(now);
        if actuators_ready {
            let cmd = self.autopilot.get_actuator_cmds();
            self.publish(topics::ACTUATOR_COMMAND, &cmd);
        }

        if self.autopilot.is_report_available() {
            let report = self.autopilot.get_report(now);
            self.publish(topics::AP_REPORT, &report);
        }
        if self.mission.is_report_available() {
            let report = self.mission.get_report(now);
            self.publish(topics::MISSION_REPORT, &report);
        }
        if let Some(report) = self.autopilot.get_colreg_report() {
            self.publish(topics::COLREG_STATUS, &report);
        }
    }

    fn ingest(&mut self, now: f64) {
        for route in self.channels.routes.drain() {
            match validate_route(&route) {
                Ok(()) => {
                    self.autopilot.set_route(route);
                }
                Err(e) => tracing::warn!(error = %e, "rejected route at ingest"),
            }
        }
        for lp in self.channels.loiter_positions.drain() {
            self.autopilot.set_loiter_position(lp);
        }
        for dp in self.channels.dive_procedures.drain() {
            match validate_dive_procedure(&dp) {
                Ok(()) => {
                    self.autopilot.set_dive_procedure(dp);
                }
                Err(e) => tracing::warn!(error = %e, "rejected dive procedure at ingest"),
            }
        }
        if let Some(mission) = self.channels.missions.take() {
            match validate_mission(&mission) {
                Ok(()) => self.mission.set_mission(mission, &mut self.autopilot),
                Err(e) => tracing::warn!(error = %e, "rejected mission at ingest"),
            }
        }
        for activation in self.channels.procedure_activations.drain() {
            self.autopilot.activate_procedure(activation, false);
        }

        // A direct autopilot command bypasses whatever mission item is in
        // flight, so it suspends the mission controller the same way an
        // operator override would (spec.md §4.11).
        let mut direct_ap_command = false;
        for command in self.channels.autopilot_commands.drain() {
            direct_ap_command = true;
            self.autopilot.update_state(command, false);
        }
        if direct_ap_command {
            self.mission
                .execute_command(MissionCommand::Suspend, &mut self.autopilot, now);
        }

        for command in self.channels.mission_commands.drain() {
            self.mission.execute_command(command, &mut self.autopilot, now);
        }

        if let Some(sensors) = self.channels.sensors.take() {
            self.autopilot.set_sensor_vals(sensors, now);
        }

        let ais_fixes: Vec<_> = self.channels.ais.drain().into_iter().flatten().collect();
        if !ais_fixes.is_empty() {
            self.autopilot.update_aivdm(&ais_fixes, now);
        }
    }

    fn publish<M: serde::Serialize>(&self, topic: &'static str, message: &M) {
        match serde_json::to_vec(message) {
            Ok(payload) => {
                if let Err(e) = self.transport.publish(topic, &payload) {
                    tracing::warn!(topic, error = %e, "publish failed");
                }
            }
            Err(e) => tracing::warn!(topic, error = %e, "failed to encode outgoing message"),
        }
    }

    /// Drive the loop at its configured tick cadence until `stop()` is
    /// called or the transport's peer disconnects.
    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            if !self.transport.peer_connected() {
                tracing::info!("peer disconnected, shutting down control loop");
                break;
            }
            let cycle_start = Instant::now();
            let now = self.elapsed_secs();
            self.tick(now);
            let elapsed = cycle_start.elapsed();
            if elapsed < self.tick_period {
                std::thread::sleep(self.tick_period - elapsed);
            } else if elapsed > self.tick_period * 2 {
                tracing::warn!(
                    budget_ms = self.tick_period.as_millis() as u64,
                    actual_ms = elapsed.as_millis() as u64,
                    "control loop tick overran its budget"
                );
            }
        }
    }
}
