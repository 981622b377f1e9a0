//! The autopilot core: owns stored procedures (routes, loiter
//! positions, dive procedures), the state machine driving which
//! executor runs each tick, and the actuator output it produces.
//!
//! Mirrors `AutopilotController` from the source 1:1 in behavior; see
//! [`route`], [`loiter`], [`depth`], [`stop`] for the per-mode
//! executors and `super::colreg`/`super::position`/`super::ais` for the
//! pieces it composes.

mod depth;
mod loiter;
mod route;
mod stop;

use std::collections::HashMap;

use auv_common::config::AutopilotConfig;
use auv_common::types::{
    ActuatorCommand, AisFix, ApReport, AutopilotCommand, AutopilotState, Coordinates,
    DiveProcedure, LoiterPosition, ProcedureActivation, ProcedureKind, Route, SensorReport,
    Waypoint,
};

use crate::ais::AisTracker;
use crate::colreg::ColregEngine;
use crate::pid::PidState;
use crate::position::PositionEstimator;

/// Everything the autopilot needs to steer, throttle, and ballast the
/// vessel for one tick, plus the bookkeeping behind its state machine
/// and status reports.
pub struct AutopilotCore {
    pub(crate) config: AutopilotConfig,

    state: AutopilotState,
    previous_state: AutopilotState,
    reset_actuators: bool,

    routes: HashMap<i64, Route>,
    loiter_positions: HashMap<i64, LoiterPosition>,
    dive_procedures: HashMap<i64, DiveProcedure>,

    route_is_set: bool,
    route_id: i64,
    waypoint_seq: Vec<Waypoint>,
    current_waypoint_index: usize,
    current_waypoint: Option<Waypoint>,
    sog_max: f64,

    loiter_position_is_set: bool,
    active_loiter_position: Option<LoiterPosition>,
    pub(crate) loiter_reached: bool,

    dive_procedure_is_set: bool,
    active_dive_procedure: Option<DiveProcedure>,
    pub(crate) tgt_depth: f64,
    pub(crate) tgt_depth_adjusted: f64,
    pub(crate) last_outside_depth_interval_ts: Option<f64>,

    sensors: Option<SensorReport>,
    actuators: ActuatorCommand,

    action_completed: bool,
    report_available: bool,
    last_report_ts: Option<f64>,

    pub(crate) position: PositionEstimator,
    pub(crate) ais: AisTracker,
    pub(crate) colreg: ColregEngine,
    colreg_report: Option<auv_common::types::ColregStatus>,

    pub(crate) engine_throttle_pid: PidState,
    pub(crate) bow_thruster_pid: PidState,
    pub(crate) stern_thruster_pid: PidState,
    pub(crate) ballast_tank_pid: PidState,
}

impl AutopilotCore {
    pub fn new(config: AutopilotConfig) -> Self {
        Self {
            config,
            state: AutopilotState::Disabled,
            previous_state: AutopilotState::Disabled,
            reset_actuators: false,
            routes: HashMap::new(),
            loiter_positions: HashMap::new(),
            dive_procedures: HashMap::new(),
            route_is_set: false,
            route_id: 0,
            waypoint_seq: Vec::new(),
            current_waypoint_index: 0,
            current_waypoint: None,
            sog_max: 5.0,
            loiter_position_is_set: false,
            active_loiter_position: None,
            loiter_reached: false,
            dive_procedure_is_set: false,
            active_dive_procedure: None,
            tgt_depth: 0.0,
            tgt_depth_adjusted: 0.0,
            last_outside_depth_interval_ts: None,
            sensors: None,
            actuators: ActuatorCommand::default(),
            action_completed: false,
            report_available: false,
            last_report_ts: None,
            position: PositionEstimator::new(),
            ais: AisTracker::new(),
            colreg: ColregEngine::new(),
            colreg_report: None,
            engine_throttle_pid: PidState::new(),
            bow_thruster_pid: PidState::new(),
            stern_thruster_pid: PidState::new(),
            ballast_tank_pid: PidState::new(),
        }
    }

    pub fn state(&self) -> AutopilotState {
        self.state
    }

    pub fn is_report_available(&self) -> bool {
        self.report_available
    }

    pub fn get_actuator_cmds(&self) -> ActuatorCommand {
        self.actuators
    }

    pub fn get_position(&self) -> Coordinates {
        self.position.position()
    }

    /// True on the first call after an action completes, then resets —
    /// matches the source's read-and-clear flag.
    pub fn is_action_completed(&mut self) -> bool {
        if self.action_completed {
            self.action_completed = false;
            true
        } else {
            false
        }
    }

    pub fn get_report(&mut self, now: f64) -> ApReport {
        let mut report = ApReport {
            state: self.state,
            ..Default::default()
        };

        if self.route_is_set {
            report.active_route_id = self.route_id;
            report.tgt_speed = self.sog_max;
            report.route_progress = self.current_waypoint_index as u32 + 1;
            report.route_len = self.waypoint_seq.len() as u32;
            report.route_name = self
                .routes
                .get(&self.route_id)
                .map(|r| r.name.clone())
                .unwrap_or_default();
            report.active_waypoint = self.current_waypoint.clone();
        }

        let pos = if self.sensors.is_some() {
            self.get_position()
        } else {
            Coordinates::ZERO
        };
        report.gnss_ap = pos;

        if let Some(lp) = &self.active_loiter_position {
            report.active_lp_id = lp.id;
            report.lp_name = lp.position.name.clone();
            if self.sensors.is_some() {
                report.lp_dist = crate::marine_math::distance_haversine(
                    pos.latitude,
                    pos.longitude,
                    lp.position.coords.latitude,
                    lp.position.coords.longitude,
                );
            }
        }

        if let Some(dp) = &self.active_dive_procedure {
            report.dp_name = dp.name.clone();
            report.tgt_depth = dp.depth;
        }

        self.last_report_ts = Some(now);
        self.report_available = false;
        report
    }

    pub fn set_route(&mut self, route: Route) -> bool {
        if route.waypoints.is_empty() {
            tracing::warn!(route_id = route.id, "rejected route with no waypoints");
            return true;
        }
        let id = route.id;
        let reactivate = self.route_is_set && self.route_id == id;
        self.routes.insert(id, route);
        if reactivate {
            self.activate_route(id);
        }
        false
    }

    pub fn set_loiter_position(&mut self, lp: LoiterPosition) -> bool {
        let id = lp.id;
        self.loiter_positions.insert(id, lp.clone());
        if self.loiter_position_is_set
            && self.active_loiter_position.as_ref().map(|a| a.id) == Some(id)
        {
            self.active_loiter_position = Some(lp);
        }
        false
    }

    pub fn set_dive_procedure(&mut self, dp: DiveProcedure) -> bool {
        let id = dp.id;
        self.dive_procedures.insert(id, dp);
        if self.dive_procedure_is_set
            && self.active_dive_procedure.as_ref().map(|a| a.id) == Some(id)
        {
            self.active_dive_procedure = self.dive_procedures.get(&id).cloned();
        }
        false
    }

    pub fn activate_route(&mut self, route_id: i64) -> bool {
        let Some(new_route) = self.routes.get(&route_id).cloned() else {
            return true;
        };

        self.waypoint_seq = new_route.waypoints.clone();
        self.sog_max = new_route.planned_speed * crate::marine_math::KNT_TO_MS;

        if self.route_is_set && self.route_id == new_route.id {
            if self.current_waypoint_index >= self.waypoint_seq.len() {
                self.current_waypoint_index = self.waypoint_seq.len() - 1;
            }
            self.current_waypoint = self.waypoint_seq.get(self.current_waypoint_index).cloned();
        } else {
            self.route_is_set = true;
            self.reset_current_waypoint();
        }

        self.route_is_set = true;
        self.route_id = new_route.id;
        false
    }

    pub fn activate_loiter_position(&mut self, loiter_position_id: i64) -> bool {
        let Some(lp) = self.loiter_positions.get(&loiter_position_id).cloned() else {
            return true;
        };
        self.active_loiter_position = Some(lp);
        self.loiter_position_is_set = true;
        false
    }

    pub fn activate_dive_procedure(&mut self, dive_procedure_id: i64) -> bool {
        let Some(dp) = self.dive_procedures.get(&dive_procedure_id).cloned() else {
            return true;
        };
        self.active_dive_procedure = Some(dp);
        self.dive_procedure_is_set = true;
        false
    }

    pub fn activate_procedure(&mut self, proc_act: ProcedureActivation, log_completion: bool) -> bool {
        // A mission-dispatched activation (log_completion=true) self-completes
        // immediately: activating a procedure doesn't arm the AP state machine
        // (see DESIGN.md), so an `until_completion` ActivateRoute/LP/DP item
        // must complete at once or the mission would hang waiting for an
        // executor that never runs. A direct operator activation bypassing
        // the mission controller leaves the flag untouched.
        if log_completion {
            self.action_completed = true;
        }
        let rejected = match proc_act.procedure_kind {
            ProcedureKind::Route => self.activate_route(proc_act.procedure_id),
            ProcedureKind::LoiterPosition => self.activate_loiter_position(proc_act.procedure_id),
            ProcedureKind::DiveProcedure => self.activate_dive_procedure(proc_act.procedure_id),
        };
        self.report_available = true;
        rejected
    }

    fn reset_current_waypoint(&mut self) {
        self.current_waypoint_index = 0;
        if self.route_is_set {
            self.current_waypoint = self.waypoint_seq.first().cloned();
        }
    }

    fn set_state(&mut self, new_state: AutopilotState) {
        self.previous_state = self.state;
        self.state = new_state;
        // pre-emptively reset actuators on every transition: kill the
        // engine on disable, let the next active executor overwrite on
        // entry to a running state
        self.reset_actuators = true;
    }

    /// Drive the autopilot state machine with a command. `log_completion`
    /// is false when the command comes directly from the operator/C2
    /// (bypassing the mission controller) — in that case any in-progress
    /// action is marked completed so a resumed mission skips it.
    pub fn update_state(&mut self, command: AutopilotCommand, log_completion: bool) -> bool {
        if !log_completion {
            self.action_completed = true;
        } else {
            self.action_completed = false;
        }

        use AutopilotCommand::*;
        use AutopilotState::*;

        match self.state {
            Disabled => match command {
                RouteStart if self.route_is_set => self.set_state(RouteEnabled),
                LoiterStart if self.loiter_position_is_set => self.set_state(Loitering),
                DiveStart if self.dive_procedure_is_set => self.set_state(Diving),
                EmergencyStop => self.set_state(EmergencyStop),
                _ => {
                    if log_completion {
                        self.action_completed = true;
                    }
                }
            },
            RouteEnabled => match command {
                RouteStop => {
                    self.reset_current_waypoint();
                    self.set_state(Disabled);
                    if log_completion {
                        self.action_completed = true;
                    }
                }
                RouteSuspend => {
                    self.set_state(RouteSuspended);
                    if log_completion {
                        self.action_completed = true;
                    }
                }
                LoiterStart if self.loiter_position_is_set => self.set_state(Loitering),
                DiveStart if self.dive_procedure_is_set => self.set_state(Diving),
                EmergencyStop => self.set_state(EmergencyStop),
                _ => {}
            },
            RouteSuspended => match command {
                RouteResume => self.set_state(RouteEnabled),
                RouteStop => {
                    self.reset_current_waypoint();
                    self.set_state(Disabled);
                    if log_completion {
                        self.action_completed = true;
                    }
                }
                LoiterStart if self.loiter_position_is_set => self.set_state(Loitering),
                DiveStart if self.dive_procedure_is_set => self.set_state(Diving),
                EmergencyStop => self.set_state(EmergencyStop),
                _ => {
                    if log_completion {
                        self.action_completed = true;
                    }
                }
            },
            Loitering => match command {
                LoiterStop => {
                    self.loiter_reached = false;
                    if self.previous_state == RouteSuspended {
                        self.set_state(RouteSuspended);
                    } else {
                        self.set_state(Disabled);
                    }
                    if log_completion {
                        self.action_completed = true;
                    }
                }
                EmergencyStop => {
                    self.loiter_reached = false;
                    self.set_state(EmergencyStop);
                }
                _ => {}
            },
            EmergencyStop => {
                if let RouteStop = command {
                    self.reset_current_waypoint();
                    self.set_state(Disabled);
                    if log_completion {
                        self.action_completed = true;
                    }
                }
            }
            Diving => match command {
                DiveStop => {
                    if self.route_is_set {
                        self.set_state(RouteSuspended);
                    } else {
                        self.set_state(Disabled);
                    }
                }
                EmergencyStop => {
                    self.loiter_reached = false;
                    self.set_state(EmergencyStop);
                }
                _ => {}
            },
        }

        self.report_available = true;
        false
    }

    pub fn set_sensor_vals(&mut self, sensors: SensorReport, now: f64) {
        self.position.update(&sensors, now);
        self.sensors = Some(sensors);
    }

    pub fn update_aivdm(&mut self, fixes: &[AisFix], now: f64) {
        if self.sensors.is_none() {
            tracing::debug!("no sensor report received yet, buffering ais fixes anyway");
        }
        self.ais.update(fixes, now);
    }

    /// Run one control tick: dispatch to the executor for the current
    /// state, returning whether a new actuator command is ready to
    /// publish.
    pub fn execute(&mut self, now: f64) -> bool {
        if self
            .last_report_ts
            .map(|t| now - t >= self.config.ap_report_interval.as_secs_f64())
            .unwrap_or(true)
        {
            self.report_available = true;
        }

        let mut output_available = false;

        if self.reset_actuators {
            self.reset_actuators = false;
            self.actuators.rudder_angle = 0.0;
            self.actuators.engine_throttle_port = 0.0;
            self.actuators.engine_throttle_stbd = 0.0;
            self.actuators.thruster_throttle_bow = 0.0;
            self.actuators.thruster_throttle_stern = 0.0;
            output_available = true;
        }

        use AutopilotState::*;
        match self.state {
            Disabled => {
                output_available |= depth::execute_maintain_depth(self, now);
            }
            RouteSuspended => {
                output_available |= depth::execute_maintain_depth(self, now);
            }
            RouteEnabled => {
                output_available |= route::execute_route(self, now);
                output_available |= depth::execute_maintain_depth(self, now);
            }
            Loitering => {
                output_available |= loiter::execute_loiter(self, now);
                output_available |= depth::execute_maintain_depth(self, now);
            }
            EmergencyStop => {
                output_available |= stop::execute_stop(self, now);
                output_available |= depth::execute_maintain_depth(self, now);
            }
            Diving => {
                output_available |= depth::execute_dive(self, now);
            }
        }

        output_available
    }

    pub(crate) fn sensors(&self) -> Option<&SensorReport> {
        self.sensors.as_ref()
    }

    pub(crate) fn actuators_mut(&mut self) -> &mut ActuatorCommand {
        &mut self.actuators
    }

    pub(crate) fn current_waypoint(&self) -> Option<&Waypoint> {
        self.current_waypoint.as_ref()
    }

    pub(crate) fn advance_waypoint_or_finish(&mut self) -> bool {
        if self.current_waypoint_index >= self.waypoint_seq.len().saturating_sub(1) {
            self.reset_current_waypoint();
            self.set_state(AutopilotState::Disabled);
            self.action_completed = true;
            return true;
        }
        self.current_waypoint_index += 1;
        self.current_waypoint = self.waypoint_seq.get(self.current_waypoint_index).cloned();
        false
    }

    pub(crate) fn active_loiter_position(&self) -> Option<&LoiterPosition> {
        self.active_loiter_position.as_ref()
    }

    pub(crate) fn dampening_rot(&self) -> f64 {
        self.config.dampening_rot
    }

    pub(crate) fn settle_from_diving_or_stop(&mut self) {
        if self.previous_state == AutopilotState::RouteSuspended {
            self.set_state(AutopilotState::RouteSuspended);
        } else {
            self.set_state(AutopilotState::Disabled);
        }
    }

    /// Engine throttle towards `sog_setpoint`, reversing sign when the
    /// vessel's axial speed indicates it's backing down.
    pub(crate) fn compute_throttle(&mut self, sog_setpoint: f64, now: f64) -> f64 {
        let Some(sensors) = self.sensors else {
            return 0.0;
        };
        let mut sog = sensors.sog;
        if sensors.speed < 0.0 {
            sog *= -1.0;
        }
        crate::pid::pid_compute(&mut self.engine_throttle_pid, &self.config.engine_throttle_pid, sog, sog_setpoint, now)
    }

    /// Rudder angle towards `wpt` from `pos`, countersteering
    /// proportionally to rate of turn and dampening the output as
    /// bearing error shrinks.
    pub(crate) fn rudder_towards(&self, pos: Coordinates, wpt: Coordinates) -> f64 {
        let Some(sensors) = self.sensors else {
            return 0.0;
        };
        let cog = sensors.cog;
        let rot = sensors.rate_of_turn * (180.0 / std::f64::consts::PI);

        let mut bearing =
            crate::marine_math::relative_bearing(cog, pos.latitude, pos.longitude, wpt.latitude, wpt.longitude);
        if bearing >= 180.0 {
            bearing -= 360.0;
        }
        if bearing <= -180.0 {
            bearing += 360.0;
        }

        let dampening = 1.0 / bearing.abs().max(1.0);
        bearing -= rot * self.dampening_rot();

        let angle = bearing.clamp(-60.0, 60.0) / 60.0 * 30.0;
        angle * (1.0 - dampening)
    }

    pub(crate) fn sog_max(&self) -> f64 {
        self.sog_max
    }

    /// Run the COLREG engine against the requested waypoint/speed,
    /// returning the (possibly overridden) outcome and stashing its
    /// report for the next `get_colreg_report` call.
    pub(crate) fn run_colreg(
        &mut self,
        own_pos: Coordinates,
        requested_wpt: Coordinates,
        requested_speed: f64,
        now: f64,
    ) -> crate::colreg::ColregOutcome {
        let Some(sensors) = self.sensors else {
            return crate::colreg::ColregOutcome {
                wpt: requested_wpt,
                speed: requested_speed,
                overridden: false,
                report: None,
            };
        };
        let outcome = self.colreg.execute(
            &self.config,
            own_pos,
            &sensors,
            &self.ais,
            requested_wpt,
            requested_speed,
            now,
        );
        if let Some(report) = outcome.report.clone() {
            self.colreg_report = Some(report);
        }
        outcome
    }

    pub fn is_colreg_report_available(&self) -> bool {
        self.colreg_report.is_some()
    }

    pub fn get_colreg_report(&mut self) -> Option<auv_common::types::ColregStatus> {
        self.colreg_report.take()
    }

    pub(crate) fn set_loiter_reached(&mut self, reached: bool) {
        self.loiter_reached = reached;
        if reached {
            self.action_completed = true;
        }
    }

    pub(crate) fn bow_thruster_control(&mut self, measured: f64, setpoint: f64, now: f64) -> f64 {
        crate::pid::angular_pid_compute(&mut self.bow_thruster_pid, &self.config.bow_thruster_pid, measured, setpoint, now)
    }

    pub(crate) fn stern_thruster_control(&mut self, measured: f64, setpoint: f64, now: f64) -> f64 {
        crate::pid::angular_pid_compute(&mut self.stern_thruster_pid, &self.config.stern_thruster_pid, measured, setpoint, now)
    }

    pub(crate) fn ballast_tank_control(&mut self, measured: f64, setpoint: f64, now: f64) -> f64 {
        crate::pid::pid_compute(&mut self.ballast_tank_pid, &self.config.ballast_tank_pid, measured, setpoint, now)
    }

    pub(crate) fn active_dive_depth(&self) -> Option<f64> {
        self.active_dive_procedure.as_ref().map(|dp| dp.depth)
    }

    pub(crate) fn mark_action_completed(&mut self) {
        self.action_completed = true;
    }
}
