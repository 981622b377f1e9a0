//! Position estimation by 5-slot-per-axis outlier voting: three raw GNSS
//! fixes plus a dead-reckoning slot and a constant-motion slot, with the
//! median treated as ground truth and anything more than 10m away from
//! it discarded before averaging the survivors.

use auv_common::types::{Coordinates, SensorReport};

use crate::marine_math::{distance_haversine, polar_to_cartesian, shift_lat, shift_long};

const OUTLIER_THRESHOLD_M: f64 = 10.0;

/// Running position estimate. `now` (seconds, monotonic) is supplied by
/// the caller so the control loop owns the clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionEstimator {
    estimate: Option<EstimateHistory>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct EstimateHistory {
    current: Coordinates,
    previous: Coordinates,
    last_sensors: SensorReport,
    last_ts: f64,
}

impl PositionEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current best estimate, or `Coordinates::ZERO` before the first
    /// update.
    pub fn position(&self) -> Coordinates {
        self.estimate.map(|e| e.current).unwrap_or(Coordinates::ZERO)
    }

    /// Fuse a new sensor report into the estimate.
    pub fn update(&mut self, sensors: &SensorReport, now: f64) {
        // placeholders duplicate gnss_1/gnss_2, matching the source, so
        // the outlier-rejection loop below never needs a branch for
        // "no previous estimate yet"
        let mut lat_vals = [
            sensors.gnss_1.latitude,
            sensors.gnss_2.latitude,
            sensors.gnss_3.latitude,
            sensors.gnss_2.latitude,
            sensors.gnss_1.latitude,
        ];
        let mut lon_vals = [
            sensors.gnss_1.longitude,
            sensors.gnss_2.longitude,
            sensors.gnss_3.longitude,
            sensors.gnss_2.longitude,
            sensors.gnss_1.longitude,
        ];

        if let Some(hist) = self.estimate {
            let delta = now - hist.last_ts;
            let sog = (hist.last_sensors.sog + sensors.sog) / 2.0;
            let cog = (hist.last_sensors.cog + sensors.cog) / 2.0;

            let (lat_shift, lon_shift) = polar_to_cartesian(cog, sog * delta);
            lat_vals[3] = shift_lat(hist.current.latitude, hist.current.longitude, lat_shift);
            // matches the source's call, which passes longitude twice
            lon_vals[3] = shift_long(hist.current.longitude, hist.current.longitude, lon_shift);

            if hist.previous.latitude != 0.0 && hist.previous.longitude != 0.0 {
                lat_vals[4] = hist.current.latitude + (hist.current.latitude - hist.previous.latitude);
                lon_vals[4] =
                    hist.current.longitude + (hist.current.longitude - hist.previous.longitude);
            }
        }

        lat_vals.sort_by(|a, b| a.partial_cmp(b).unwrap());
        lon_vals.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let lat_ref = lat_vals[2];
        let lon_ref = lon_vals[2];

        let mut lat_sum = 0.0;
        let mut lat_count = 0i32;
        let mut lon_sum = 0.0;
        let mut lon_count = 0i32;

        for i in 0..5 {
            let lat_offset = distance_haversine(lat_vals[i], lon_ref, lat_ref, lon_ref);
            let lon_offset = distance_haversine(lat_ref, lon_vals[i], lat_ref, lon_ref);
            if lat_offset.abs() < OUTLIER_THRESHOLD_M {
                lat_sum += lat_vals[i];
                lat_count += 1;
            }
            if lon_offset.abs() < OUTLIER_THRESHOLD_M {
                lon_sum += lon_vals[i];
                lon_count += 1;
            }
        }

        let previous = self.estimate.map(|e| e.current).unwrap_or(Coordinates::ZERO);
        let current = Coordinates {
            latitude: lat_sum / lat_count as f64,
            longitude: lon_sum / lon_count as f64,
        };

        self.estimate = Some(EstimateHistory {
            current,
            previous,
            last_sensors: *sensors,
            last_ts: now,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensors_at(lat: f64, lon: f64) -> SensorReport {
        SensorReport {
            heading: 0.0,
            cog: 0.0,
            sog: 0.0,
            speed: 0.0,
            rate_of_turn: 0.0,
            rudder_angle: 0.0,
            port_rpm: 0.0,
            stbd_rpm: 0.0,
            port_throttle: 0.0,
            stbd_throttle: 0.0,
            depth_under_keel: 100.0,
            ship_depth: 0.0,
            buoyancy: 1.0,
            gnss_1: Coordinates {
                latitude: lat,
                longitude: lon,
            },
            gnss_2: Coordinates {
                latitude: lat,
                longitude: lon,
            },
            gnss_3: Coordinates {
                latitude: lat,
                longitude: lon,
            },
        }
    }

    #[test]
    fn zero_before_first_update() {
        let est = PositionEstimator::new();
        assert_eq!(est.position(), Coordinates::ZERO);
    }

    #[test]
    fn agreeing_fixes_average_to_the_same_point() {
        let mut est = PositionEstimator::new();
        est.update(&sensors_at(10.0, 20.0), 0.0);
        let pos = est.position();
        assert!((pos.latitude - 10.0).abs() < 1e-9);
        assert!((pos.longitude - 20.0).abs() < 1e-9);
    }

    #[test]
    fn outlier_gnss_fix_is_rejected() {
        let mut est = PositionEstimator::new();
        let mut sensors = sensors_at(10.0, 20.0);
        // gnss_3 wildly off: should be excluded from the vote
        sensors.gnss_3.latitude = 50.0;
        est.update(&sensors, 0.0);
        let pos = est.position();
        assert!((pos.latitude - 10.0).abs() < 0.01);
    }

    #[test]
    fn estimate_tracks_across_updates() {
        let mut est = PositionEstimator::new();
        est.update(&sensors_at(10.0, 20.0), 0.0);
        est.update(&sensors_at(10.001, 20.0), 1.0);
        let pos = est.position();
        assert!(pos.latitude > 10.0);
    }
}
