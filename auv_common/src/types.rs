//! Wire-level data model exchanged between the vessel control core and
//! the simulator / operator station over the [`crate::transport`] boundary.
//!
//! These types carry no behavior of their own; they are plain data,
//! matching the "pervasive nullable pointers → optional types" and
//! "enum action variants stored as union-with-discriminator → tagged
//! sum type" translations from the design notes.

use serde::{Deserialize, Serialize};

/// A WGS84 decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const ZERO: Coordinates = Coordinates {
        latitude: 0.0,
        longitude: 0.0,
    };
}

/// A named point along a route, or a loiter position's anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub coords: Coordinates,
}

/// A planned route. Invariant: `waypoints` is never empty once stored —
/// zero-waypoint routes are rejected at ingest (see [`crate::error::IngestError`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: i64,
    pub name: String,
    /// Planned speed, in knots.
    pub planned_speed: f64,
    pub waypoints: Vec<Waypoint>,
}

/// A stationkeeping position: a point plus the heading to hold while on
/// station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoiterPosition {
    pub id: i64,
    pub position: Waypoint,
    /// Heading to hold on station, degrees, `[0, 360)`.
    pub bearing: f64,
}

/// A target submergence depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveProcedure {
    pub id: i64,
    pub name: String,
    /// Target depth in meters, non-negative.
    pub depth: f64,
}

impl DiveProcedure {
    // `name` is not compared for the unit-struct-like call sites below, so
    // tests can build one quickly.
    #[cfg(test)]
    pub fn bare(id: i64, depth: f64) -> Self {
        Self {
            id,
            name: String::new(),
            depth,
        }
    }
}

/// Which stored-procedure kind a [`ProcedureActivation`] or
/// [`MissionItemAction`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcedureKind {
    Route,
    LoiterPosition,
    DiveProcedure,
}

/// Sets a stored procedure active without starting the autopilot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcedureActivation {
    pub procedure_kind: ProcedureKind,
    pub procedure_id: i64,
}

/// The autopilot's command vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotCommand {
    RouteStart,
    RouteStop,
    RouteSuspend,
    RouteResume,
    LoiterStart,
    LoiterStop,
    DiveStart,
    DiveStop,
    EmergencyStop,
}

/// Tagged sum type for a mission item's action — exactly one variant is
/// ever set, unlike the source's union-with-discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MissionItemAction {
    ActivateRoute(i64),
    ActivateLoiterPosition(i64),
    ActivateDiveProcedure(i64),
    SetApCommand(AutopilotCommand),
}

/// One step of a mission: an action, bounded by completion or timeout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissionItem {
    /// If true, the item completes only when the autopilot reports
    /// `action_completed`; otherwise it completes on `timeout`.
    pub until_completion: bool,
    /// Seconds, or negative for "infinite" (no timeout).
    pub timeout: i64,
    pub action: MissionItemAction,
}

/// A complete mission: a named, ordered list of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: i64,
    pub name: String,
    pub items: Vec<MissionItem>,
}

/// Mission controller commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionCommand {
    Start,
    Stop,
    Suspend,
    Resume,
    SkipStep,
}

/// Mission controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissionStatus {
    Disabled,
    Enabled,
    Suspended,
}

/// Autopilot state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutopilotState {
    Disabled,
    RouteEnabled,
    RouteSuspended,
    Loitering,
    Diving,
    EmergencyStop,
}

/// AIS navigational status, per the AIS standard's 0-15 status codes.
/// Unrecognized/unsupported codes decode to `Unknown` rather than being
/// rejected — AIS telemetry is best-effort, unlike route/mission ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavStatus {
    UnderwayUsingEngine,
    AtAnchor,
    NotUnderCommand,
    RestrictedManoeuvrability,
    ConstrainedByDraught,
    Moored,
    Aground,
    EngagedInFishing,
    UnderwaySailing,
    AisSartMobEpirb,
    Unknown,
}

impl NavStatus {
    /// Decode a raw AIS status code (0-15). Unknown/reserved codes map to
    /// [`NavStatus::Unknown`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::UnderwayUsingEngine,
            1 => Self::AtAnchor,
            2 => Self::NotUnderCommand,
            3 => Self::RestrictedManoeuvrability,
            4 => Self::ConstrainedByDraught,
            5 => Self::Moored,
            6 => Self::Aground,
            7 => Self::EngagedInFishing,
            8 => Self::UnderwaySailing,
            14 => Self::AisSartMobEpirb,
            _ => Self::Unknown,
        }
    }
}

/// A single AIS target fix, keyed by `mmsi` in [`crate::transport`]'s
/// ingest inbox and in the tracker's map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AisFix {
    pub mmsi: i64,
    pub nav_status: NavStatus,
    pub lat: f64,
    pub lon: f64,
    /// Rate of turn, rad/s.
    pub rot: f64,
    /// Course over ground, degrees true.
    pub cog: f64,
    /// Speed over ground, m/s.
    pub sog: f64,
}

/// Per-tick telemetry from the vessel/simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    /// True heading, degrees.
    pub heading: f64,
    /// Course over ground, degrees true.
    pub cog: f64,
    /// Speed over ground, m/s (always non-negative).
    pub sog: f64,
    /// Axial (fore/aft) speed, m/s, signed — negative means reversing.
    pub speed: f64,
    /// Rate of turn, rad/s.
    pub rate_of_turn: f64,
    pub rudder_angle: f64,
    pub port_rpm: f64,
    pub stbd_rpm: f64,
    pub port_throttle: f64,
    pub stbd_throttle: f64,
    /// Distance from keel to seafloor, meters.
    pub depth_under_keel: f64,
    /// Submergence depth, meters (0 = surfaced).
    pub ship_depth: f64,
    /// Displaced-water mass over ship mass; >1 floats, <1 sinks.
    pub buoyancy: f64,
    pub gnss_1: Coordinates,
    pub gnss_2: Coordinates,
    pub gnss_3: Coordinates,
}

/// Actuator setpoints published to the simulator each tick an output is
/// available.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActuatorCommand {
    /// Degrees, clamped to `[-30, 30]`.
    pub rudder_angle: f64,
    /// Signed `[-1, 1]` for conventional propulsion.
    pub engine_throttle_port: f64,
    pub engine_throttle_stbd: f64,
    /// Signed `[-1, 1]`.
    pub thruster_throttle_bow: f64,
    pub thruster_throttle_stern: f64,
    /// Signed `[-1, 1]`; negative empties the ballast tank (surfacing).
    pub ballast_tank_pump: f64,
}

/// COLREG encounter classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColregType {
    Inactive,
    Overtaking,
    Overtaken,
    Crossing,
    HeadToHead,
}

/// Published whenever the COLREG engine's own minimum-interval timer
/// fires.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColregStatus {
    pub situation: ColregType,
    pub tgt_mmsi: i64,
    pub tgt_pos: Coordinates,
}

impl Default for ColregStatus {
    fn default() -> Self {
        Self {
            situation: ColregType::Inactive,
            tgt_mmsi: 0,
            tgt_pos: Coordinates::ZERO,
        }
    }
}

/// Autopilot status report, published on every state change and at
/// least every `REPORT_INTERVAL_AP`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApReport {
    pub state: AutopilotState,
    pub active_route_id: i64,
    /// 1-based index of the active waypoint within the active route.
    pub route_progress: u32,
    pub route_len: u32,
    pub route_name: String,
    pub active_waypoint: Option<Waypoint>,
    pub tgt_speed: f64,
    pub active_lp_id: i64,
    pub lp_dist: f64,
    pub lp_name: String,
    pub dp_name: String,
    pub tgt_depth: f64,
    pub gnss_ap: Coordinates,
}

impl Default for ApReport {
    fn default() -> Self {
        Self {
            state: AutopilotState::Disabled,
            active_route_id: 0,
            route_progress: 0,
            route_len: 0,
            route_name: String::new(),
            active_waypoint: None,
            tgt_speed: 0.0,
            active_lp_id: 0,
            lp_dist: 0.0,
            lp_name: String::new(),
            dp_name: String::new(),
            tgt_depth: 0.0,
            gnss_ap: Coordinates::ZERO,
        }
    }
}

/// Mission status report, published on every state change and at least
/// every `REPORT_INTERVAL_MS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    pub name: String,
    pub status: MissionStatus,
    /// 1-based index of the current item.
    pub progress: u32,
    pub length: u32,
}

impl Default for MissionReport {
    fn default() -> Self {
        Self {
            name: String::new(),
            status: MissionStatus::Disabled,
            progress: 0,
            length: 0,
        }
    }
}
