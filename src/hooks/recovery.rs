//! Edge-triggered recover/recovered hooks.
//!
//! Called by the orchestrator after the result has been recorded. They only
//! write `recover_info`/`recovered_info`, never the counters.

use std::time::Duration;
use tracing::{info, warn};

use super::executor::{run_command, HookOutcome};
use crate::models::MonitorData;

impl MonitorData {
    /// Run the recover command if this tick is the first failure past tolerance.
    ///
    /// Returns the outcome when the command was attempted.
    pub fn attempt_recover(&mut self, timeout: Duration) -> Option<HookOutcome> {
        let Some(command) = self.settings.recover_command.clone() else {
            self.recover_info.clear();
            return None;
        };
        if !self.is_first_failure() {
            return None;
        }

        info!(monitor = %self.name, "Attempting recovery command");
        let outcome = run_command(&command, timeout);
        log_outcome(&self.name, "recovery", &outcome);
        self.recover_info = outcome.to_string();
        Some(outcome)
    }

    /// Run the recovered command if this tick is the first success after a
    /// failure past tolerance.
    pub fn run_recovered(&mut self, timeout: Duration) -> Option<HookOutcome> {
        let Some(command) = self.settings.recovered_command.clone() else {
            self.recovered_info.clear();
            return None;
        };
        if !self.just_recovered() {
            return None;
        }

        info!(monitor = %self.name, "Attempting recovered command");
        let outcome = run_command(&command, timeout);
        log_outcome(&self.name, "recovered", &outcome);
        self.recovered_info = outcome.to_string();
        Some(outcome)
    }
}

fn log_outcome(monitor: &str, hook: &str, outcome: &HookOutcome) {
    if outcome.is_success() {
        info!(monitor, hook, "{outcome}");
    } else {
        warn!(monitor, hook, "{outcome}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonitorSettings;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn monitor_with_hooks(recover: Option<&str>, recovered: Option<&str>) -> MonitorData {
        let settings = MonitorSettings {
            tolerance: 1,
            recover_command: recover.map(String::from),
            recovered_command: recovered.map(String::from),
            ..MonitorSettings::default()
        };
        MonitorData::new("svc", "null", settings, "probe01")
    }

    #[test]
    fn test_no_recover_command_clears_info() {
        let mut monitor = monitor_with_hooks(None, None);
        monitor.recover_info = "stale".to_string();
        monitor.recovered_info = "stale".to_string();

        assert!(monitor.attempt_recover(TIMEOUT).is_none());
        assert!(monitor.run_recovered(TIMEOUT).is_none());
        assert_eq!(monitor.recover_info(), "");
        assert_eq!(monitor.recovered_info(), "");
    }

    #[test]
    fn test_recover_not_attempted_within_tolerance() {
        let mut monitor = monitor_with_hooks(Some("/nonexistent/hook"), None);
        monitor.record_failure("down");
        assert!(monitor.attempt_recover(TIMEOUT).is_none());
        assert_eq!(monitor.recover_info(), "");
    }

    #[test]
    fn test_recover_failure_is_recorded_not_raised() {
        let mut monitor = monitor_with_hooks(Some("/nonexistent/hook --restart"), None);
        monitor.record_failure("down");
        monitor.record_failure("down");
        assert!(monitor.is_first_failure());

        let outcome = monitor.attempt_recover(TIMEOUT);
        assert!(matches!(outcome, Some(HookOutcome::LaunchFailed(_))));
        assert!(monitor.recover_info().starts_with("Unable to run command: "));
        // counters untouched
        assert_eq!(monitor.error_count(), 2);
        assert_eq!(monitor.failures(), 1);
    }

    #[test]
    fn test_recover_fires_only_on_edge() {
        let mut monitor = monitor_with_hooks(Some("/nonexistent/hook"), None);
        monitor.record_failure("down");
        monitor.record_failure("down");
        assert!(monitor.attempt_recover(TIMEOUT).is_some());

        monitor.record_failure("down");
        assert!(monitor.attempt_recover(TIMEOUT).is_none());
        // previous result is kept between edges
        assert!(monitor.recover_info().starts_with("Unable to run command: "));
    }

    #[cfg(unix)]
    #[test]
    fn test_recovered_runs_once_after_recovery() {
        let mut monitor = monitor_with_hooks(None, Some("true"));
        monitor.record_failure("down");
        monitor.record_failure("down");
        assert!(monitor.run_recovered(TIMEOUT).is_none());

        monitor.record_success("up");
        let outcome = monitor.run_recovered(TIMEOUT);
        assert_eq!(outcome, Some(HookOutcome::Executed { exit_code: 0 }));
        assert_eq!(monitor.recovered_info(), "Command executed and returned 0");

        monitor.record_success("up");
        assert!(monitor.run_recovered(TIMEOUT).is_none());
    }
}
