//! AIS target tracking: a flat map keyed by MMSI, updated in place on
//! every AIVDM batch. No eviction by default — a target that stops
//! transmitting simply goes stale in the map until config opts into
//! [`auv_common::config::AutopilotConfig::ais_stale_after`].

use std::collections::HashMap;

use auv_common::types::AisFix;

/// One tracked contact: the latest fix plus the time it was received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AisTarget {
    pub fix_ts: f64,
    pub fix: AisFix,
}

#[derive(Debug, Clone, Default)]
pub struct AisTracker {
    targets: HashMap<i64, AisTarget>,
}

impl AisTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest a batch of AIVDM fixes, each keyed by `mmsi`, stamped with
    /// `now` (seconds, monotonic).
    pub fn update(&mut self, fixes: &[AisFix], now: f64) {
        for fix in fixes {
            tracing::debug!(
                mmsi = fix.mmsi,
                lat = fix.lat,
                lon = fix.lon,
                cog = fix.cog,
                sog = fix.sog,
                "ais fix received"
            );
            self.targets.insert(fix.mmsi, AisTarget { fix_ts: now, fix: *fix });
        }
    }

    /// Targets to consider for COLREG/report purposes. With
    /// `stale_after` set, targets older than that window relative to
    /// `now` are skipped as candidates (but remain in the map).
    pub fn active_targets(&self, now: f64, stale_after: Option<f64>) -> impl Iterator<Item = &AisTarget> {
        self.targets.values().filter(move |t| match stale_after {
            Some(window) => now - t.fix_ts <= window,
            None => true,
        })
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auv_common::types::NavStatus;

    fn fix(mmsi: i64, lat: f64, lon: f64) -> AisFix {
        AisFix {
            mmsi,
            nav_status: NavStatus::UnderwayUsingEngine,
            lat,
            lon,
            rot: 0.0,
            cog: 90.0,
            sog: 3.0,
        }
    }

    #[test]
    fn new_target_is_inserted() {
        let mut tracker = AisTracker::new();
        tracker.update(&[fix(123, 1.0, 2.0)], 0.0);
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn repeated_mmsi_updates_in_place() {
        let mut tracker = AisTracker::new();
        tracker.update(&[fix(123, 1.0, 2.0)], 0.0);
        tracker.update(&[fix(123, 1.5, 2.5)], 1.0);
        assert_eq!(tracker.len(), 1);
        let t = tracker.active_targets(1.0, None).next().unwrap();
        assert_eq!(t.fix.lat, 1.5);
    }

    #[test]
    fn stale_after_none_never_filters() {
        let mut tracker = AisTracker::new();
        tracker.update(&[fix(123, 1.0, 2.0)], 0.0);
        assert_eq!(tracker.active_targets(10_000.0, None).count(), 1);
    }

    #[test]
    fn stale_after_filters_old_targets() {
        let mut tracker = AisTracker::new();
        tracker.update(&[fix(123, 1.0, 2.0)], 0.0);
        assert_eq!(tracker.active_targets(100.0, Some(10.0)).count(), 0);
        assert_eq!(tracker.len(), 1, "stale targets stay in the map");
    }
}
