//! COLREG collision avoidance: predict closest point of approach (CPA)
//! against every tracked AIS target, pick the most pressing one, and
//! override the requested waypoint/speed to dodge it.
//!
//! Own-ship's future track is swept once per call as a straight line at
//! constant heading/speed for a 65-second horizon — an intentional
//! simplification carried over from the source, not something to "fix"
//! by re-integrating per target.

use auv_common::config::AutopilotConfig;
use auv_common::types::{ColregStatus, ColregType, Coordinates, SensorReport};

use crate::ais::AisTracker;
use crate::marine_math::{distance_haversine, polar_to_cartesian, relative_bearing, relative_heading, shift_lat, shift_long};

const CPA_HORIZON_STEPS: usize = 65;

/// Persistent state the COLREG engine carries across ticks: when it
/// last reported, when it last actively overrode steering, and in what
/// direction, for the U-turn safeguard.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColregEngine {
    last_report_ts: Option<f64>,
    last_override_ts: Option<f64>,
    last_override_bearing: f64,
}

pub struct ColregOutcome {
    pub wpt: Coordinates,
    pub speed: f64,
    pub overridden: bool,
    pub report: Option<ColregStatus>,
}

impl ColregEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate COLREG against all tracked targets and return a
    /// (possibly overridden) waypoint/speed pair.
    #[allow(clippy::too_many_arguments)]
    pub fn execute(
        &mut self,
        config: &AutopilotConfig,
        own_pos: Coordinates,
        sensors: &SensorReport,
        ais: &AisTracker,
        requested_wpt: Coordinates,
        requested_speed: f64,
        now: f64,
    ) -> ColregOutcome {
        let should_report = self
            .last_report_ts
            .map(|t| now - t >= config.colreg_report_interval.as_secs_f64())
            .unwrap_or(true);
        if should_report {
            self.last_report_ts = Some(now);
        }

        let (own_lat_shift, own_lon_shift) = polar_to_cartesian(sensors.cog, sensors.sog);
        let future_own_pos: Vec<(f64, f64)> = (0..CPA_HORIZON_STEPS)
            .map(|i| (own_lat_shift * i as f64, own_lon_shift * i as f64))
            .collect();

        let mut cpa_t_min = f64::MAX;
        let mut best: Option<(i64, f64, f64, Coordinates)> = None; // mmsi, cog, sog, estimated_pos
        let mut best_bearing = 0.0;

        for target in ais.active_targets(now, config.ais_stale_after.map(|d| d.as_secs_f64())) {
            let fix_delta = now - target.fix_ts;
            let (lat_shift, lon_shift) = polar_to_cartesian(target.fix.cog, target.fix.sog);
            let estimated_lat = shift_lat(target.fix.lat, target.fix.lon, lat_shift * fix_delta);
            let estimated_lon = shift_long(target.fix.lat, target.fix.lon, lon_shift * fix_delta);

            let current_distance =
                distance_haversine(own_pos.latitude, own_pos.longitude, estimated_lat, estimated_lon);
            if current_distance > config.colreg_check_radius {
                continue;
            }

            let current_bearing =
                relative_bearing(0.0, own_pos.latitude, own_pos.longitude, estimated_lat, estimated_lon);
            let (mut rel_lat, mut rel_lon) = polar_to_cartesian(current_bearing, current_distance);

            let mut local_cpa_d = f64::MAX;
            let mut local_cpa_t = 0.0;
            for i in 0..future_own_pos.len() {
                let (flat, flon) = future_own_pos[i];
                let current_d = ((flat - rel_lat).powi(2) + (flon - rel_lon).powi(2)).sqrt();
                if current_d < local_cpa_d {
                    local_cpa_d = current_d;
                } else {
                    break;
                }
                local_cpa_t = i as f64;
                rel_lat += lat_shift;
                rel_lon += lon_shift;
            }

            tracing::trace!(
                mmsi = target.fix.mmsi,
                cpa_distance = local_cpa_d,
                cpa_time = local_cpa_t,
                "colreg cpa sweep"
            );

            if local_cpa_d < config.colreg_cpad && local_cpa_t - 1.0 < cpa_t_min {
                cpa_t_min = local_cpa_t;
                best_bearing = (360.0 + current_bearing - sensors.cog).rem_euclid(360.0);
                best = Some((
                    target.fix.mmsi,
                    target.fix.cog,
                    target.fix.sog,
                    Coordinates {
                        latitude: estimated_lat,
                        longitude: estimated_lon,
                    },
                ));
            }
        }

        let mut wpt_bearing =
            relative_bearing(sensors.cog, own_pos.latitude, own_pos.longitude, requested_wpt.latitude, requested_wpt.longitude);
        if wpt_bearing > 180.0 {
            wpt_bearing -= 360.0;
        }

        let mut wpt = requested_wpt;
        let mut speed = requested_speed;

        if let Some((mmsi, tgt_cog, tgt_sog, tgt_pos)) = best {
            let mut tgt_rel_heading = relative_heading(sensors.cog, tgt_cog);
            let mut tgt_bearing = best_bearing;
            if tgt_rel_heading > 180.0 {
                tgt_rel_heading -= 360.0;
            }
            if tgt_bearing > 180.0 {
                tgt_bearing -= 360.0;
            }

            let situation;
            if tgt_rel_heading.abs() <= 22.5 && tgt_sog > 0.1 {
                if tgt_bearing.abs() < 45.0 {
                    situation = ColregType::Overtaking;
                    speed = speed.min(tgt_sog * 0.8);
                } else {
                    situation = ColregType::Overtaken;
                    speed = speed.max(tgt_sog * 1.2);
                }
            } else if tgt_rel_heading.abs() <= 157.5 {
                situation = ColregType::Crossing;
                let (lat_off, lon_off) =
                    polar_to_cartesian((tgt_cog + 180.0).rem_euclid(360.0), config.colreg_cpad * 1.6);
                let colreg_lat = shift_lat(tgt_pos.latitude, tgt_pos.longitude, lat_off);
                let colreg_lon = shift_long(tgt_pos.latitude, tgt_pos.longitude, lon_off);
                let mut colreg_bearing =
                    relative_bearing(sensors.cog, own_pos.latitude, own_pos.longitude, colreg_lat, colreg_lon);
                if colreg_bearing > 180.0 {
                    colreg_bearing -= 360.0;
                }

                if wpt_bearing * colreg_bearing >= 0.0 && wpt_bearing.abs() > colreg_bearing.abs() {
                    speed = 0.85 * speed;
                } else {
                    wpt = Coordinates {
                        latitude: colreg_lat,
                        longitude: colreg_lon,
                    };
                    speed = 0.65 * speed;
                    if cpa_t_min < 10.0 {
                        speed = 0.3 * speed;
                    }
                }
            } else {
                situation = ColregType::HeadToHead;
                let inv_bearing =
                    relative_bearing(tgt_cog, tgt_pos.latitude, tgt_pos.longitude, own_pos.latitude, own_pos.longitude);
                let direction = if inv_bearing > 180.0 { -1.0 } else { 1.0 };

                let (lat_off, lon_off) = polar_to_cartesian(
                    (360.0 + tgt_cog + direction * 156.5).rem_euclid(360.0),
                    2.2 * config.colreg_cpad,
                );
                let colreg_lat = shift_lat(tgt_pos.latitude, tgt_pos.longitude, lat_off);
                let colreg_lon = shift_long(tgt_pos.latitude, tgt_pos.longitude, lon_off);
                let mut colreg_bearing =
                    relative_bearing(sensors.cog, own_pos.latitude, own_pos.longitude, colreg_lat, colreg_lon);
                if colreg_bearing > 180.0 {
                    colreg_bearing -= 360.0;
                }

                if wpt_bearing * colreg_bearing >= 0.0
                    && wpt_bearing.abs() > colreg_bearing.abs()
                    && !(tgt_bearing.abs() > 90.0 && wpt_bearing.abs() > 90.0)
                {
                    speed = 0.95 * speed;
                } else {
                    wpt = Coordinates {
                        latitude: colreg_lat,
                        longitude: colreg_lon,
                    };
                    speed = 0.84 * speed;
                }
            }

            tracing::debug!(mmsi, ?situation, cpa_t_min, tgt_rel_heading, tgt_bearing, "colreg override");

            let report = should_report.then_some(ColregStatus {
                situation,
                tgt_mmsi: mmsi,
                tgt_pos,
            });

            self.last_override_bearing =
                relative_bearing(0.0, own_pos.latitude, own_pos.longitude, wpt.latitude, wpt.longitude);
            self.last_override_ts = Some(now);

            return ColregOutcome {
                wpt,
                speed,
                overridden: true,
                report,
            };
        }

        if wpt_bearing.abs() > 90.0
            && self
                .last_override_ts
                .map(|t| now - t < config.colreg_uturn_safeguard.as_secs_f64())
                .unwrap_or(false)
        {
            let (lat_shift, lon_shift) =
                polar_to_cartesian(self.last_override_bearing, (1.0 + speed) * 30.0);
            wpt = Coordinates {
                latitude: shift_lat(own_pos.latitude, own_pos.longitude, lat_shift),
                longitude: shift_long(own_pos.latitude, own_pos.longitude, lon_shift),
            };
        }

        ColregOutcome {
            wpt,
            speed,
            overridden: false,
            report: should_report.then(|| ColregStatus {
                situation: ColregType::Inactive,
                ..Default::default()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auv_common::types::NavStatus;

    fn base_sensors() -> SensorReport {
        SensorReport {
            heading: 0.0,
            cog: 0.0,
            sog: 3.0,
            speed: 3.0,
            rate_of_turn: 0.0,
            rudder_angle: 0.0,
            port_rpm: 0.0,
            stbd_rpm: 0.0,
            port_throttle: 0.0,
            stbd_throttle: 0.0,
            depth_under_keel: 100.0,
            ship_depth: 0.0,
            buoyancy: 1.0,
            gnss_1: Coordinates::ZERO,
            gnss_2: Coordinates::ZERO,
            gnss_3: Coordinates::ZERO,
        }
    }

    #[test]
    fn no_targets_means_no_override() {
        let mut engine = ColregEngine::new();
        let config = AutopilotConfig::default();
        let ais = AisTracker::new();
        let outcome = engine.execute(
            &config,
            Coordinates::ZERO,
            &base_sensors(),
            &ais,
            Coordinates {
                latitude: 0.01,
                longitude: 0.0,
            },
            3.0,
            0.0,
        );
        assert!(!outcome.overridden);
    }

    #[test]
    fn head_on_target_on_collision_course_triggers_override() {
        use auv_common::types::AisFix;
        let mut engine = ColregEngine::new();
        let config = AutopilotConfig::default();
        let mut ais = AisTracker::new();
        // target dead ahead, heading straight back at us
        ais.update(
            &[AisFix {
                mmsi: 1,
                nav_status: NavStatus::UnderwayUsingEngine,
                lat: 0.0018,
                lon: 0.0,
                rot: 0.0,
                cog: 180.0,
                sog: 3.0,
            }],
            0.0,
        );
        let outcome = engine.execute(
            &config,
            Coordinates::ZERO,
            &base_sensors(),
            &ais,
            Coordinates {
                latitude: 0.01,
                longitude: 0.0,
            },
            3.0,
            0.0,
        );
        assert!(outcome.overridden);
        assert_eq!(
            outcome.report.unwrap().situation,
            ColregType::HeadToHead
        );
    }

    #[test]
    fn distant_target_outside_check_radius_is_ignored() {
        use auv_common::types::AisFix;
        let mut engine = ColregEngine::new();
        let config = AutopilotConfig::default();
        let mut ais = AisTracker::new();
        ais.update(
            &[AisFix {
                mmsi: 2,
                nav_status: NavStatus::UnderwayUsingEngine,
                lat: 50.0,
                lon: 50.0,
                rot: 0.0,
                cog: 180.0,
                sog: 3.0,
            }],
            0.0,
        );
        let outcome = engine.execute(
            &config,
            Coordinates::ZERO,
            &base_sensors(),
            &ais,
            Coordinates {
                latitude: 0.01,
                longitude: 0.0,
            },
            3.0,
            0.0,
        );
        assert!(!outcome.overridden);
    }
}
