//! Common re-exports for crates that consume `auv_common`.

pub use crate::config::{AutopilotConfig, ConfigLoader, PidGains};
pub use crate::error::{ConfigError, IngestError, TransportError};
pub use crate::transport::{topics, Inbox, LatestInbox, Transport};
pub use crate::types::{
    ActuatorCommand, AisFix, ApReport, AutopilotCommand, AutopilotState, Coordinates,
    DiveProcedure, LoiterPosition, Mission, MissionCommand, MissionItem, MissionItemAction,
    MissionReport, MissionStatus, NavStatus, ProcedureActivation, ProcedureKind, Route,
    SensorReport, Waypoint, ColregStatus, ColregType,
};
pub use crate::validate::{validate_dive_procedure, validate_mission, validate_route};
