//! Ingest-boundary validation: the checks that happen before a stored
//! procedure or mission ever reaches the autopilot/mission controllers,
//! matching the malformed-input category of the error taxonomy (prior
//! state retained, rejection logged by the caller).
//!
//! `auv_autopilot`'s setters additionally refuse an empty route or
//! mission on their own (defense in depth for callers that bypass this
//! module), but the control loop is expected to call these first so the
//! rejection reason is available for the ingest log line.

use crate::error::IngestError;
use crate::types::{DiveProcedure, Mission, Route};

/// Reject a route with no waypoints (spec.md §3: "a stored route always
/// has at least one waypoint").
pub fn validate_route(route: &Route) -> Result<(), IngestError> {
    if route.waypoints.is_empty() {
        return Err(IngestError::EmptyRoute { id: route.id });
    }
    Ok(())
}

/// Reject a mission with no items.
pub fn validate_mission(mission: &Mission) -> Result<(), IngestError> {
    if mission.items.is_empty() {
        return Err(IngestError::EmptyMission { id: mission.id });
    }
    Ok(())
}

/// Reject a dive procedure with a negative target depth.
pub fn validate_dive_procedure(dp: &DiveProcedure) -> Result<(), IngestError> {
    if dp.depth < 0.0 {
        return Err(IngestError::NegativeDepth {
            id: dp.id,
            depth: dp.depth,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coordinates, MissionItem, MissionItemAction, Waypoint};

    fn waypoint() -> Waypoint {
        Waypoint {
            name: "wpt".into(),
            coords: Coordinates::ZERO,
        }
    }

    #[test]
    fn empty_route_rejected() {
        let route = Route {
            id: 1,
            name: "r".into(),
            planned_speed: 3.0,
            waypoints: vec![],
        };
        assert_eq!(validate_route(&route), Err(IngestError::EmptyRoute { id: 1 }));
    }

    #[test]
    fn non_empty_route_accepted() {
        let route = Route {
            id: 1,
            name: "r".into(),
            planned_speed: 3.0,
            waypoints: vec![waypoint()],
        };
        assert!(validate_route(&route).is_ok());
    }

    #[test]
    fn empty_mission_rejected() {
        let mission = Mission {
            id: 1,
            name: "m".into(),
            items: vec![],
        };
        assert_eq!(validate_mission(&mission), Err(IngestError::EmptyMission { id: 1 }));
    }

    #[test]
    fn non_empty_mission_accepted() {
        let mission = Mission {
            id: 1,
            name: "m".into(),
            items: vec![MissionItem {
                until_completion: false,
                timeout: 5,
                action: MissionItemAction::ActivateRoute(1),
            }],
        };
        assert!(validate_mission(&mission).is_ok());
    }

    #[test]
    fn negative_depth_rejected() {
        let dp = DiveProcedure {
            id: 1,
            name: "d".into(),
            depth: -1.0,
        };
        assert_eq!(
            validate_dive_procedure(&dp),
            Err(IngestError::NegativeDepth { id: 1, depth: -1.0 })
        );
    }

    #[test]
    fn non_negative_depth_accepted() {
        let dp = DiveProcedure {
            id: 1,
            name: "d".into(),
            depth: 0.0,
        };
        assert!(validate_dive_procedure(&dp).is_ok());
    }
}
