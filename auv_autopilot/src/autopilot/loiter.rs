//! Loiter executor: approach a stationkeeping point like a route
//! waypoint, then hold heading (and eventually position) once within
//! the stay radius, using the bow/stern thruster PIDs to null out
//! bearing error.

use crate::marine_math::distance_haversine;

use super::AutopilotCore;

pub(super) fn execute_loiter(core: &mut AutopilotCore, now: f64) -> bool {
    if core.sensors().is_none() {
        return false;
    }

    let pos = core.get_position();
    let Some(lp) = core.active_loiter_position().cloned() else {
        return false;
    };
    let target_pos = lp.position.coords;
    let target_bearing = lp.bearing;
    let bearing = core.sensors().map(|s| s.heading).unwrap_or(0.0);

    let d_to_target =
        distance_haversine(pos.latitude, pos.longitude, target_pos.latitude, target_pos.longitude);

    if !core.loiter_reached && d_to_target < core.config.loiter_arrival_radius {
        core.set_loiter_reached(true);
    }
    if core.loiter_reached && d_to_target > core.config.loiter_stay_radius {
        core.set_loiter_reached(false);
    }

    if !core.loiter_reached {
        core.actuators_mut().thruster_throttle_bow = 0.0;
        core.actuators_mut().thruster_throttle_stern = 0.0;

        let mut target_sog = (d_to_target - core.config.loiter_arrival_radius) / 25.0;
        if target_sog < 0.2 {
            target_sog = 0.2;
        }
        if target_sog > core.sog_max() {
            target_sog = core.sog_max();
        }

        let outcome = core.run_colreg(pos, target_pos, target_sog, now);

        let throttle = core.compute_throttle(outcome.speed, now);
        core.actuators_mut().engine_throttle_port = throttle;
        core.actuators_mut().engine_throttle_stbd = throttle;

        let wheel = core.rudder_towards(pos, outcome.wpt);
        let wheel_abs = wheel.abs();
        core.actuators_mut().rudder_angle = wheel;

        if throttle < 0.6 && wheel_abs > 1.0 {
            if throttle > 0.2 {
                let diff = 1.0 + (60.0f64.min(wheel_abs) / 60.0);
                if wheel > 0.0 {
                    core.actuators_mut().engine_throttle_port *= diff;
                    core.actuators_mut().engine_throttle_stbd /= diff;
                } else {
                    core.actuators_mut().engine_throttle_port /= diff;
                    core.actuators_mut().engine_throttle_stbd *= diff;
                }
            } else {
                core.actuators_mut().rudder_angle = 0.0;
                let mut assist = (wheel_abs / 60.0).min(0.8);
                assist = (wheel / wheel_abs) * assist;
                core.actuators_mut().thruster_throttle_bow = assist;
            }
        }
    } else {
        let throttle = core.compute_throttle(0.0, now);
        core.actuators_mut().engine_throttle_port = throttle;
        core.actuators_mut().engine_throttle_stbd = throttle;
        core.actuators_mut().rudder_angle = 0.0;

        let bow = core.bow_thruster_control(bearing, target_bearing, now);
        core.actuators_mut().thruster_throttle_bow = bow;
        let stern = core.stern_thruster_control(bearing, target_bearing, now);
        core.actuators_mut().thruster_throttle_stern = stern;
    }

    true
}
