//! Mission sequencing: advances through a list of [`MissionItem`]s,
//! each either run until the autopilot reports completion or for a
//! fixed timeout, dispatching actions into an [`AutopilotCore`] passed
//! in explicitly at call time.
//!
//! The source stores a raw pointer to `AutopilotController` inside
//! `MissionController`. Rust has no safe equivalent to "I'll dereference
//! this whenever I feel like it" without `unsafe` or shared-mutability
//! wrappers neither crate needs elsewhere, so the autopilot is instead
//! passed as `&mut AutopilotCore` into [`MissionController::run`] and
//! `execute_command`/`set_mission` — the mission controller owns no
//! reference to it between calls.

use auv_common::types::{Mission, MissionCommand, MissionItem, MissionItemAction, MissionReport, MissionStatus};

use crate::autopilot::AutopilotCore;

pub struct MissionController {
    status: MissionStatus,
    mission: Option<Mission>,
    mission_index: usize,
    item_start_ts: f64,
    item_timeout: f64,
    pause_start_ts: f64,
    report_available: bool,
    last_report_ts: Option<f64>,
}

impl MissionController {
    pub fn new() -> Self {
        Self {
            status: MissionStatus::Disabled,
            mission: None,
            mission_index: 0,
            item_start_ts: 0.0,
            item_timeout: f64::INFINITY,
            pause_start_ts: 0.0,
            report_available: false,
            last_report_ts: None,
        }
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    pub fn is_report_available(&self) -> bool {
        self.report_available
    }

    pub fn get_report(&mut self, now: f64) -> MissionReport {
        let mut report = MissionReport {
            status: self.status,
            ..Default::default()
        };
        if let Some(mission) = &self.mission {
            report.name = mission.name.clone();
            report.progress = self.mission_index as u32 + 1;
            report.length = mission.items.len() as u32;
        }
        self.report_available = false;
        self.last_report_ts = Some(now);
        report
    }

    /// Store a mission. Rejects empty item lists outright (matching the
    /// source). Replacing the active mission always stops it — resuming
    /// an in-progress mission mid-edit isn't supported.
    pub fn set_mission(&mut self, mission: Mission, ap: &mut AutopilotCore) {
        if mission.items.is_empty() {
            tracing::warn!(mission_id = mission.id, "rejected mission with no items");
            return;
        }
        self.mission = Some(mission);
        self.execute_command(MissionCommand::Stop, ap, 0.0);
    }

    pub fn execute_command(&mut self, command: MissionCommand, ap: &mut AutopilotCore, now: f64) {
        use MissionCommand::*;
        use MissionStatus::*;

        match self.status {
            Disabled => match command {
                Start => {
                    if self.mission.is_some() {
                        self.status = Enabled;
                        self.execute_current_item(ap, now);
                    }
                }
                Stop => {
                    self.mission_index = 0;
                }
                _ => {}
            },
            Enabled => match command {
                Stop => {
                    self.status = Disabled;
                    self.mission_index = 0;
                }
                Suspend => {
                    self.status = Suspended;
                    self.pause_start_ts = now;
                }
                SkipStep => {
                    self.mission_index += 1;
                    if self.at_end() {
                        self.execute_command(Stop, ap, now);
                    } else {
                        self.execute_current_item(ap, now);
                    }
                }
                _ => {}
            },
            Suspended => match command {
                Stop => {
                    self.status = Disabled;
                    self.mission_index = 0;
                }
                Resume => {
                    self.status = Enabled;
                    self.item_start_ts = now - (self.pause_start_ts - self.item_start_ts);
                }
                _ => {}
            },
        }

        self.report_available = true;
    }

    fn at_end(&self) -> bool {
        self.mission
            .as_ref()
            .map(|m| self.mission_index >= m.items.len())
            .unwrap_or(true)
    }

    fn current_item(&self) -> Option<&MissionItem> {
        self.mission.as_ref().and_then(|m| m.items.get(self.mission_index))
    }

    fn execute_current_item(&mut self, ap: &mut AutopilotCore, now: f64) {
        self.report_available = true;
        self.item_start_ts = now;

        let Some(item) = self.current_item().cloned() else {
            return;
        };
        self.item_timeout = if item.timeout >= 0 {
            item.timeout as f64
        } else {
            f64::INFINITY
        };

        match item.action {
            MissionItemAction::ActivateLoiterPosition(id) => {
                ap.activate_procedure(
                    auv_common::types::ProcedureActivation {
                        procedure_kind: auv_common::types::ProcedureKind::LoiterPosition,
                        procedure_id: id,
                    },
                    true,
                );
            }
            MissionItemAction::ActivateRoute(id) => {
                ap.activate_procedure(
                    auv_common::types::ProcedureActivation {
                        procedure_kind: auv_common::types::ProcedureKind::Route,
                        procedure_id: id,
                    },
                    true,
                );
            }
            MissionItemAction::ActivateDiveProcedure(id) => {
                ap.activate_procedure(
                    auv_common::types::ProcedureActivation {
                        procedure_kind: auv_common::types::ProcedureKind::DiveProcedure,
                        procedure_id: id,
                    },
                    true,
                );
            }
            MissionItemAction::SetApCommand(cmd) => {
                ap.update_state(cmd, true);
            }
        }
    }

    /// Advance the mission by one tick: checks completion/timeout for
    /// the current item and moves on (or stops, at the end) when due.
    pub fn run(&mut self, ap: &mut AutopilotCore, now: f64) {
        if self
            .last_report_ts
            .map(|t| now - t >= ap.config.mission_report_interval.as_secs_f64())
            .unwrap_or(true)
        {
            self.report_available = true;
        }

        if matches!(self.status, MissionStatus::Disabled | MissionStatus::Suspended) {
            return;
        }

        let Some(item) = self.current_item().cloned() else {
            return;
        };

        let item_complete = if item.until_completion {
            ap.is_action_completed()
        } else {
            now - self.item_start_ts >= self.item_timeout
        };

        if item_complete {
            self.mission_index += 1;
            if self.at_end() {
                self.execute_command(MissionCommand::Stop, ap, now);
            } else {
                self.execute_current_item(ap, now);
            }
        }
    }
}

impl Default for MissionController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auv_common::config::AutopilotConfig;
    use auv_common::types::{DiveProcedure, MissionItem};

    fn dive_item(id: i64, until_completion: bool, timeout: i64) -> MissionItem {
        MissionItem {
            until_completion,
            timeout,
            action: MissionItemAction::ActivateDiveProcedure(id),
        }
    }

    fn mission(items: Vec<MissionItem>) -> Mission {
        Mission {
            id: 1,
            name: "test".into(),
            items,
        }
    }

    #[test]
    fn empty_mission_rejected() {
        let mut mc = MissionController::new();
        let mut ap = AutopilotCore::new(AutopilotConfig::default());
        mc.set_mission(mission(vec![]), &mut ap);
        assert_eq!(mc.status(), MissionStatus::Disabled);
        assert!(mc.current_item().is_none());
    }

    #[test]
    fn setting_mission_stops_it() {
        let mut mc = MissionController::new();
        let mut ap = AutopilotCore::new(AutopilotConfig::default());
        mc.set_mission(mission(vec![dive_item(1, false, 10)]), &mut ap);
        assert_eq!(mc.status(), MissionStatus::Disabled);
    }

    #[test]
    fn start_runs_the_first_item() {
        let mut mc = MissionController::new();
        let mut ap = AutopilotCore::new(AutopilotConfig::default());
        ap.set_dive_procedure(DiveProcedure::bare(1, 10.0));
        mc.set_mission(mission(vec![dive_item(1, false, 10)]), &mut ap);
        mc.execute_command(MissionCommand::Start, &mut ap, 0.0);
        assert_eq!(mc.status(), MissionStatus::Enabled);
    }

    #[test]
    fn timeout_advances_to_stop_at_last_item() {
        let mut mc = MissionController::new();
        let mut ap = AutopilotCore::new(AutopilotConfig::default());
        ap.set_dive_procedure(DiveProcedure::bare(1, 10.0));
        mc.set_mission(mission(vec![dive_item(1, false, 5)]), &mut ap);
        mc.execute_command(MissionCommand::Start, &mut ap, 0.0);
        mc.run(&mut ap, 10.0);
        assert_eq!(mc.status(), MissionStatus::Disabled);
    }

    #[test]
    fn suspend_then_resume_preserves_item_progress() {
        let mut mc = MissionController::new();
        let mut ap = AutopilotCore::new(AutopilotConfig::default());
        ap.set_dive_procedure(DiveProcedure::bare(1, 10.0));
        mc.set_mission(mission(vec![dive_item(1, false, 100)]), &mut ap);
        mc.execute_command(MissionCommand::Start, &mut ap, 0.0);
        mc.execute_command(MissionCommand::Suspend, &mut ap, 5.0);
        assert_eq!(mc.status(), MissionStatus::Suspended);
        mc.execute_command(MissionCommand::Resume, &mut ap, 20.0);
        assert_eq!(mc.status(), MissionStatus::Enabled);
    }
}
