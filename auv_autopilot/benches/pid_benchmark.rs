//! PID micro-benchmark.
//!
//! Measures the per-call cost of the linear and angular PID channels
//! that run every tick for every actuator (rudder, throttle, bow/stern
//! thrusters, ballast).

use criterion::{criterion_group, criterion_main, Criterion};

use auv_autopilot::pid::{angular_pid_compute, pid_compute, PidState};
use auv_common::config::PidGains;

const DT: f64 = 0.25; // 4 Hz tick cadence

fn reference_gains() -> PidGains {
    PidGains {
        kp: 1.2,
        ki: 0.05,
        kd: 0.3,
        out_min: -35.0,
        out_max: 35.0,
        integral_decay: 0.98,
    }
}

fn bench_pid_compute(c: &mut Criterion) {
    let gains = reference_gains();
    let mut state = PidState::new();
    let mut now = 0.0;

    c.bench_function("pid_compute", |b| {
        b.iter(|| {
            now += DT;
            let measured = 5.0 * (now * 0.3).sin();
            pid_compute(&mut state, &gains, measured, 0.0, now)
        });
    });
}

fn bench_angular_pid_compute(c: &mut Criterion) {
    let gains = reference_gains();
    let mut state = PidState::new();
    let mut now = 0.0;

    c.bench_function("angular_pid_compute", |b| {
        b.iter(|| {
            now += DT;
            let heading = (now * 10.0) % 360.0;
            angular_pid_compute(&mut state, &gains, heading, 180.0, now)
        });
    });
}

criterion_group!(benches, bench_pid_compute, bench_angular_pid_compute);
criterion_main!(benches);
