//! Depth/ballast executor: maintain a target submergence depth (capped
//! by seafloor clearance) via the ballast tank pump PID, and the dive
//! procedure executor that drives it until depth stabilizes within
//! tolerance for long enough to call the dive complete.

use super::AutopilotCore;

pub(super) fn execute_maintain_depth(core: &mut AutopilotCore, now: f64) -> bool {
    let Some(sensors) = core.sensors().copied() else {
        return false;
    };

    let current_depth = sensors.ship_depth;
    let tgt_depth_adjusted = core
        .tgt_depth
        .min(core.config.min_depth_offset + sensors.depth_under_keel + current_depth);
    core.tgt_depth_adjusted = tgt_depth_adjusted;

    let error = tgt_depth_adjusted - current_depth;
    if error >= 0.0 && sensors.buoyancy > 1.002 {
        // above target and significantly less dense than displaced
        // water: run the pump at full tilt to avoid needlessly growing
        // the PID's integral term while filling an empty tank. Also
        // pre-fills the tank at the surface so a later dive is faster.
        core.actuators_mut().ballast_tank_pump = 1.0;
        return true;
    }

    let pid_output = core.ballast_tank_control(current_depth, tgt_depth_adjusted, now);

    if sensors.buoyancy > 1.0004 && pid_output < 0.0 && core.state() != auv_common::types::AutopilotState::EmergencyStop
    {
        core.actuators_mut().ballast_tank_pump = 0.0;
    } else if sensors.buoyancy < 0.9996 && pid_output > 0.0 {
        core.actuators_mut().ballast_tank_pump = 0.0;
    } else {
        core.actuators_mut().ballast_tank_pump = pid_output;
    }

    true
}

pub(super) fn execute_dive(core: &mut AutopilotCore, now: f64) -> bool {
    if core.sensors().is_none() {
        return false;
    }

    core.tgt_depth = core.active_dive_depth().unwrap_or(0.0);
    execute_maintain_depth(core, now);

    let depth_delta = (core.tgt_depth_adjusted - core.sensors().unwrap().ship_depth).abs();
    if depth_delta > core.config.depth_tolerance {
        core.last_outside_depth_interval_ts = Some(now);
    }

    let outside_for = now - core.last_outside_depth_interval_ts.unwrap_or(now);
    if outside_for > core.config.depth_tolerance_timeout.as_secs_f64() {
        core.mark_action_completed();
        core.settle_from_diving_or_stop();
    }

    true
}
