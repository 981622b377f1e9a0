//! PID controller with the cold-start reset and subtract-on-saturation
//! anti-windup scheme used across every autopilot actuator channel.
//!
//! Unlike the teacher's `evo_control_unit::control::pid` (backward-Euler
//! integration with Tf-filtered derivative and Tt-based back-calculation
//! anti-windup), this reimplements the vessel control source's simpler
//! scheme verbatim — the derivative term is `(error - prev_error) * delta`
//! (multiplied, not divided by delta), and anti-windup subtracts the
//! latest contribution back out of the integral rather than
//! back-calculating through a tracking-time constant. Gains are tuned
//! against this exact formula and must reproduce it bit-for-bit.

use auv_common::config::PidGains;

/// Mutable per-channel PID state. `now` is supplied by the caller (in
/// seconds, monotonic) rather than read internally, so the control loop
/// owns the single clock source and tests can drive time explicitly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidState {
    integral: f64,
    previous_error: f64,
    last_ts: Option<f64>,
}

impl PidState {
    pub fn new() -> Self {
        Self {
            integral: 0.0,
            previous_error: 0.0,
            last_ts: None,
        }
    }
}

impl Default for PidState {
    fn default() -> Self {
        Self::new()
    }
}

/// Cold-start / long-gap reset window: an update separated from the
/// previous one by more than this resets the integral and skips the
/// derivative term instead of integrating across the gap.
pub const TIMEOUT: f64 = 15.0;

fn control_with_error(state: &mut PidState, gains: &PidGains, error: f64, now: f64) -> f64 {
    let mut delta = match state.last_ts {
        None => 0.0,
        Some(last) => now - last,
    };

    if delta > TIMEOUT {
        delta = 0.0;
        state.integral = 0.0;
    }
    state.last_ts = Some(now);

    let derivative = (error - state.previous_error) * delta;
    state.previous_error = error;

    state.integral = state.integral * gains.integral_decay + error * delta;

    let mut output = gains.kp * error + gains.ki * state.integral + gains.kd * derivative;

    let mut saturated = false;
    if output > gains.out_max {
        output = gains.out_max;
        saturated = true;
    } else if output < gains.out_min {
        output = gains.out_min;
        saturated = true;
    }

    if saturated {
        state.integral -= error * delta;
    }

    output
}

/// Linear PID: error is `setpoint - measured` with no wraparound.
pub fn pid_compute(
    state: &mut PidState,
    gains: &PidGains,
    measured: f64,
    setpoint: f64,
    now: f64,
) -> f64 {
    let error = setpoint - measured;
    tracing::debug!(target: "pid", setpoint, measured, error, "pid control");
    control_with_error(state, gains, error, now)
}

/// Angular PID: error is `setpoint - measured` wrapped into
/// `[-180, 180]` degrees, for heading/bearing channels where 359 and 1
/// are 2 degrees apart, not 358.
pub fn angular_pid_compute(
    state: &mut PidState,
    gains: &PidGains,
    measured: f64,
    setpoint: f64,
    now: f64,
) -> f64 {
    let mut error = setpoint - measured;
    if error < -180.0 {
        error += 360.0;
    }
    if error > 180.0 {
        error -= 360.0;
    }
    tracing::debug!(target: "pid", setpoint, measured, error, "angular pid control");
    control_with_error(state, gains, error, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gains(kp: f64, ki: f64, kd: f64) -> PidGains {
        PidGains {
            kp,
            ki,
            kd,
            out_min: -1.0,
            out_max: 1.0,
            integral_decay: 1.0,
        }
    }

    #[test]
    fn first_update_has_no_integral_or_derivative() {
        let mut state = PidState::new();
        let output = pid_compute(&mut state, &gains(0.5, 1.0, 1.0), 0.0, 1.0, 100.0);
        assert_eq!(output, 0.5);
    }

    #[test]
    fn zero_gains_produce_zero_output() {
        let mut state = PidState::new();
        let output = pid_compute(&mut state, &gains(0.0, 0.0, 0.0), 3.0, 10.0, 100.0);
        assert_eq!(output, 0.0);
    }

    #[test]
    fn integral_accumulates_over_time() {
        let mut state = PidState::new();
        pid_compute(&mut state, &gains(0.0, 1.0, 0.0), 0.0, 1.0, 100.0);
        let second = pid_compute(&mut state, &gains(0.0, 1.0, 0.0), 0.0, 1.0, 101.0);
        assert!(second > 0.0);
    }

    #[test]
    fn gap_exceeding_timeout_resets_integral() {
        let mut state = PidState::new();
        pid_compute(&mut state, &gains(0.0, 1.0, 0.0), 0.0, 1.0, 100.0);
        pid_compute(&mut state, &gains(0.0, 1.0, 0.0), 0.0, 1.0, 101.0);
        // jump far beyond TIMEOUT
        let output = pid_compute(&mut state, &gains(0.0, 1.0, 0.0), 0.0, 1.0, 200.0);
        assert_eq!(output, 0.0);
    }

    #[test]
    fn anti_windup_caps_integral_growth_on_saturation() {
        let mut state = PidState::new();
        let g = gains(0.0, 10.0, 0.0);
        let mut last = 0.0;
        for t in 1..20 {
            last = pid_compute(&mut state, &g, 0.0, 1.0, t as f64);
        }
        assert_eq!(last, g.out_max);
    }

    #[test]
    fn angular_pid_wraps_across_north() {
        let mut state = PidState::new();
        let output = angular_pid_compute(&mut state, &gains(1.0, 0.0, 0.0), 359.0, 1.0, 100.0);
        // error should be +2, not -358
        assert_eq!(output, 2.0);
    }

    #[test]
    fn angular_pid_wraps_the_other_direction() {
        let mut state = PidState::new();
        let output = angular_pid_compute(&mut state, &gains(1.0, 0.0, 0.0), 1.0, 359.0, 100.0);
        assert_eq!(output, -2.0);
    }
}
