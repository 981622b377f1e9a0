//! TOML-loadable configuration for the autopilot/mission control core,
//! following `evo_common::config`'s `ConfigLoader`/`SharedConfig`
//! pattern: a struct with `#[serde(default = ...)]` per field backed by
//! a `Defaults` constants module, plus a loader trait so tests can
//! inject a config without touching the filesystem.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Named constants pinned from the original autopilot controller's
/// steering/COLREG/PID tuning. Kept as a standalone module (rather than
/// inlined only in `AutopilotConfig::default`) so call sites that need a
/// bare constant — not the whole config — can reference it directly.
pub mod defaults {
    use std::time::Duration;

    pub const WPT_ARRIVAL_RADIUS: f64 = 35.0;
    pub const LOITER_ARRIVAL_RADIUS: f64 = 35.0;
    /// Must stay greater than `LOITER_ARRIVAL_RADIUS` or the vessel can
    /// orbit forever just outside the arrival radius.
    pub const LOITER_STAY_RADIUS: f64 = 45.0;
    pub const DAMPENING_ROT: f64 = 6.0;

    /// Maximum acceptable depth error before `DiveExecutor` reports not
    /// yet on target.
    pub const DEPTH_TOLERANCE: f64 = 3.0;
    pub const DEPTH_TOLERANCE_TIMEOUT: Duration = Duration::from_secs(20);
    /// Must stay greater than 1.0 — the simulator's own ballast-tank
    /// floor.
    pub const MIN_DEPTH_OFFSET: f64 = 2.5;

    pub const COLREG_REPORT_INTERVAL: Duration = Duration::from_millis(1450);
    pub const COLREG_UTURN_SAFEGUARD: Duration = Duration::from_secs(5);
    pub const COLREG_CHECK_RADIUS: f64 = 750.0;
    /// CPA distance under which a target is considered dangerous.
    pub const COLREG_CPAD: f64 = 57.0;

    pub const AP_REPORT_INTERVAL: Duration = Duration::from_millis(750);
    pub const MISSION_REPORT_INTERVAL: Duration = Duration::from_secs(15);

    /// PID cold-start reset window: an update separated from the
    /// previous one by more than this resets integral/derivative state
    /// instead of integrating across the gap.
    pub const PID_TIMEOUT: Duration = Duration::from_secs(15);

    /// `(kp, ki, kd, out_min, out_max, integral_decay)`. None of the
    /// four channels override `integral_decay` from its 1.0 default.
    pub const ENGINE_THROTTLE_PID: (f64, f64, f64, f64, f64, f64) =
        (0.15, 0.05, 0.0, -1.0, 1.0, 1.0);
    pub const BOW_THRUSTER_PID: (f64, f64, f64, f64, f64, f64) =
        (0.0115, 0.00008, 0.00005, -0.7, 0.7, 1.0);
    pub const STERN_THRUSTER_PID: (f64, f64, f64, f64, f64, f64) =
        (-0.0115, -0.00008, -0.00005, -0.7, 0.7, 1.0);
    pub const BALLAST_TANK_PID: (f64, f64, f64, f64, f64, f64) =
        (0.021, 0.00003, 0.001, -1.0, 1.0, 1.0);

    pub const STARTUP_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
    pub const TICK_PERIOD: Duration = Duration::from_millis(250);
}

/// Gains and output clamp for one PID channel, loadable from TOML and
/// matching `PidController`/`AngularPidController`'s constructor shape
/// `(kp, ki, kd, out_min, out_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub out_min: f64,
    pub out_max: f64,
    #[serde(default = "default_integral_decay")]
    pub integral_decay: f64,
}

fn default_integral_decay() -> f64 {
    1.0
}

impl From<(f64, f64, f64, f64, f64, f64)> for PidGains {
    fn from(t: (f64, f64, f64, f64, f64, f64)) -> Self {
        Self {
            kp: t.0,
            ki: t.1,
            kd: t.2,
            out_min: t.3,
            out_max: t.4,
            integral_decay: t.5,
        }
    }
}

fn default_engine_throttle_pid() -> PidGains {
    defaults::ENGINE_THROTTLE_PID.into()
}
fn default_bow_thruster_pid() -> PidGains {
    defaults::BOW_THRUSTER_PID.into()
}
fn default_stern_thruster_pid() -> PidGains {
    defaults::STERN_THRUSTER_PID.into()
}
fn default_ballast_tank_pid() -> PidGains {
    defaults::BALLAST_TANK_PID.into()
}

fn default_wpt_arrival_radius() -> f64 {
    defaults::WPT_ARRIVAL_RADIUS
}
fn default_loiter_arrival_radius() -> f64 {
    defaults::LOITER_ARRIVAL_RADIUS
}
fn default_loiter_stay_radius() -> f64 {
    defaults::LOITER_STAY_RADIUS
}
fn default_dampening_rot() -> f64 {
    defaults::DAMPENING_ROT
}
fn default_depth_tolerance() -> f64 {
    defaults::DEPTH_TOLERANCE
}
fn default_depth_tolerance_timeout() -> Duration {
    defaults::DEPTH_TOLERANCE_TIMEOUT
}
fn default_min_depth_offset() -> f64 {
    defaults::MIN_DEPTH_OFFSET
}
fn default_colreg_report_interval() -> Duration {
    defaults::COLREG_REPORT_INTERVAL
}
fn default_colreg_uturn_safeguard() -> Duration {
    defaults::COLREG_UTURN_SAFEGUARD
}
fn default_colreg_check_radius() -> f64 {
    defaults::COLREG_CHECK_RADIUS
}
fn default_colreg_cpad() -> f64 {
    defaults::COLREG_CPAD
}
fn default_ap_report_interval() -> Duration {
    defaults::AP_REPORT_INTERVAL
}
fn default_mission_report_interval() -> Duration {
    defaults::MISSION_REPORT_INTERVAL
}
fn default_tick_period() -> Duration {
    defaults::TICK_PERIOD
}
fn default_startup_connect_timeout() -> Duration {
    defaults::STARTUP_CONNECT_TIMEOUT
}

/// Full autopilot/mission tuning, TOML-loadable with every field
/// defaulted to the source's pinned constants so an empty/partial file
/// is always valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutopilotConfig {
    #[serde(default = "default_wpt_arrival_radius")]
    pub wpt_arrival_radius: f64,
    #[serde(default = "default_loiter_arrival_radius")]
    pub loiter_arrival_radius: f64,
    #[serde(default = "default_loiter_stay_radius")]
    pub loiter_stay_radius: f64,
    #[serde(default = "default_dampening_rot")]
    pub dampening_rot: f64,

    #[serde(default = "default_depth_tolerance")]
    pub depth_tolerance: f64,
    #[serde(default = "default_depth_tolerance_timeout")]
    pub depth_tolerance_timeout: Duration,
    #[serde(default = "default_min_depth_offset")]
    pub min_depth_offset: f64,

    #[serde(default = "default_colreg_report_interval")]
    pub colreg_report_interval: Duration,
    #[serde(default = "default_colreg_uturn_safeguard")]
    pub colreg_uturn_safeguard: Duration,
    #[serde(default = "default_colreg_check_radius")]
    pub colreg_check_radius: f64,
    #[serde(default = "default_colreg_cpad")]
    pub colreg_cpad: f64,

    #[serde(default = "default_ap_report_interval")]
    pub ap_report_interval: Duration,
    #[serde(default = "default_mission_report_interval")]
    pub mission_report_interval: Duration,
    #[serde(default = "default_tick_period")]
    pub tick_period: Duration,
    #[serde(default = "default_startup_connect_timeout")]
    pub startup_connect_timeout: Duration,

    #[serde(default = "default_engine_throttle_pid")]
    pub engine_throttle_pid: PidGains,
    #[serde(default = "default_bow_thruster_pid")]
    pub bow_thruster_pid: PidGains,
    #[serde(default = "default_stern_thruster_pid")]
    pub stern_thruster_pid: PidGains,
    #[serde(default = "default_ballast_tank_pid")]
    pub ballast_tank_pid: PidGains,

    /// Optional AIS target staleness window. `None` (the default)
    /// preserves the source's behavior of never evicting or skipping
    /// targets by age.
    #[serde(default)]
    pub ais_stale_after: Option<Duration>,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            wpt_arrival_radius: default_wpt_arrival_radius(),
            loiter_arrival_radius: default_loiter_arrival_radius(),
            loiter_stay_radius: default_loiter_stay_radius(),
            dampening_rot: default_dampening_rot(),
            depth_tolerance: default_depth_tolerance(),
            depth_tolerance_timeout: default_depth_tolerance_timeout(),
            min_depth_offset: default_min_depth_offset(),
            colreg_report_interval: default_colreg_report_interval(),
            colreg_uturn_safeguard: default_colreg_uturn_safeguard(),
            colreg_check_radius: default_colreg_check_radius(),
            colreg_cpad: default_colreg_cpad(),
            ap_report_interval: default_ap_report_interval(),
            mission_report_interval: default_mission_report_interval(),
            tick_period: default_tick_period(),
            startup_connect_timeout: default_startup_connect_timeout(),
            engine_throttle_pid: default_engine_throttle_pid(),
            bow_thruster_pid: default_bow_thruster_pid(),
            stern_thruster_pid: default_stern_thruster_pid(),
            ballast_tank_pid: default_ballast_tank_pid(),
            ais_stale_after: None,
        }
    }
}

impl AutopilotConfig {
    /// Reject configs that would break the steering geometry invariant
    /// the original carries as a comment: the loiter stay radius must
    /// exceed the arrival radius, or the vessel can orbit forever just
    /// outside "arrived."
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loiter_stay_radius <= self.loiter_arrival_radius {
            return Err(ConfigError::Invalid(format!(
                "loiter_stay_radius ({}) must exceed loiter_arrival_radius ({})",
                self.loiter_stay_radius, self.loiter_arrival_radius
            )));
        }
        if self.min_depth_offset <= 1.0 {
            return Err(ConfigError::Invalid(format!(
                "min_depth_offset ({}) must exceed 1.0",
                self.min_depth_offset
            )));
        }
        Ok(())
    }
}

/// Loads an [`AutopilotConfig`] from a source. Implemented for `&Path`
/// directly; tests implement it for an in-memory string to avoid
/// filesystem round-trips.
pub trait ConfigLoader {
    fn load(self) -> Result<AutopilotConfig, ConfigError>;
}

impl ConfigLoader for &Path {
    fn load(self) -> Result<AutopilotConfig, ConfigError> {
        let text = std::fs::read_to_string(self).map_err(|source| ConfigError::Read {
            path: self.display().to_string(),
            source,
        })?;
        let config: AutopilotConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }
}

/// Load from an explicit path, falling back to built-in defaults when
/// no path is given — matching the CLI's `--config` being optional.
pub fn load_or_default(path: Option<&Path>) -> Result<AutopilotConfig, ConfigError> {
    match path {
        Some(p) => p.load(),
        None => Ok(AutopilotConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        assert!(AutopilotConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_file_loads_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "").unwrap();
        let config: AutopilotConfig = file.path().load().unwrap();
        assert_eq!(config, AutopilotConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "wpt_arrival_radius = 50.0\n").unwrap();
        let config: AutopilotConfig = file.path().load().unwrap();
        assert_eq!(config.wpt_arrival_radius, 50.0);
        assert_eq!(config.colreg_cpad, defaults::COLREG_CPAD);
    }

    #[test]
    fn bad_stay_radius_rejected() {
        let mut config = AutopilotConfig::default();
        config.loiter_stay_radius = config.loiter_arrival_radius;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not valid toml {{{{").unwrap();
        assert!(matches!(
            file.path().load(),
            Err(ConfigError::Parse { .. })
        ));
    }
}
