//! Route-following executor: steer towards the active waypoint,
//! advancing (or finishing) when within arrival radius, letting COLREG
//! override waypoint/speed before steering is computed.

use auv_common::types::Coordinates;

use crate::marine_math::distance_haversine;

use super::AutopilotCore;

pub(super) fn execute_route(core: &mut AutopilotCore, now: f64) -> bool {
    if core.sensors().is_none() {
        return false;
    }

    let pos = core.get_position();
    let Some(mut wpt) = core.current_waypoint().cloned() else {
        return false;
    };

    let mut d_to_waypoint =
        distance_haversine(pos.latitude, pos.longitude, wpt.coords.latitude, wpt.coords.longitude);

    if d_to_waypoint < core.config.wpt_arrival_radius {
        if core.advance_waypoint_or_finish() {
            return false;
        }
        wpt = core.current_waypoint().cloned().expect("waypoint set after advance");
        d_to_waypoint =
            distance_haversine(pos.latitude, pos.longitude, wpt.coords.latitude, wpt.coords.longitude);
    }
    let _ = d_to_waypoint;

    let requested_sog = core.sog_max();
    let requested_wpt = Coordinates {
        latitude: wpt.coords.latitude,
        longitude: wpt.coords.longitude,
    };

    let outcome = core.run_colreg(pos, requested_wpt, requested_sog, now);

    let throttle = core.compute_throttle(outcome.speed, now);
    core.actuators_mut().engine_throttle_port = throttle;
    core.actuators_mut().engine_throttle_stbd = throttle;
    core.actuators_mut().thruster_throttle_bow = 0.0;
    core.actuators_mut().thruster_throttle_stern = 0.0;

    core.actuators_mut().rudder_angle = core.rudder_towards(pos, outcome.wpt);

    true
}
