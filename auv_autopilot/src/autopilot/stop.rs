//! Emergency-stop executor: force the vessel to surface and zero the
//! helm, killing the engine and rescinding autopilot control once speed
//! and depth both settle near zero.

use auv_common::types::AutopilotCommand;

use super::AutopilotCore;

pub(super) fn execute_stop(core: &mut AutopilotCore, now: f64) -> bool {
    if core.sensors().is_none() {
        return false;
    }

    core.tgt_depth = 0.0;
    core.actuators_mut().rudder_angle = 0.0;
    core.actuators_mut().thruster_throttle_bow = 0.0;
    core.actuators_mut().thruster_throttle_stern = 0.0;

    let sensors = *core.sensors().unwrap();
    if sensors.sog < 0.05 && sensors.ship_depth == 0.0 {
        core.actuators_mut().engine_throttle_port = 0.0;
        core.actuators_mut().engine_throttle_stbd = 0.0;
        core.update_state(AutopilotCommand::RouteStop, true);
        return true;
    }

    let throttle = core.compute_throttle(0.0, now);
    core.actuators_mut().engine_throttle_port = throttle;
    core.actuators_mut().engine_throttle_stbd = throttle;

    true
}
