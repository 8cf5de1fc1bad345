//! One scheduling tick of one monitor.

use std::time::Duration;
use tracing::debug;

use crate::runtime::Monitor;

/// What happened to a monitor in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The check ran and the monitor is within tolerance
    Passed,
    /// The check ran and the monitor is failing beyond tolerance
    Failed,
    /// The gate throttled the monitor; recorded as a plain skip
    Throttled,
    /// An upstream dependency did not succeed this cycle
    DependencySkipped(String),
}

impl TickOutcome {
    /// Whether monitors depending on this one may proceed.
    ///
    /// A throttled monitor was not re-tested but its last result stands.
    pub fn satisfies_dependents(&self) -> bool {
        matches!(self, TickOutcome::Passed | TickOutcome::Throttled)
    }
}

/// Per-cycle summary, names sorted within each list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    pub throttled: Vec<String>,
    /// `(monitor, blocking dependency)`
    pub dependency_skipped: Vec<(String, String)>,
}

impl CycleReport {
    pub(crate) fn record(&mut self, name: String, outcome: TickOutcome) {
        match outcome {
            TickOutcome::Passed => self.passed.push(name),
            TickOutcome::Failed => self.failed.push(name),
            TickOutcome::Throttled => self.throttled.push(name),
            TickOutcome::DependencySkipped(dep) => self.dependency_skipped.push((name, dep)),
        }
    }

    pub(crate) fn sort(&mut self) {
        self.passed.sort();
        self.failed.sort();
        self.throttled.sort();
        self.dependency_skipped.sort();
    }

    pub fn total(&self) -> usize {
        self.passed.len() + self.failed.len() + self.throttled.len() + self.dependency_skipped.len()
    }
}

/// Drive one monitor through the dependency check, the gate, the test and
/// the hooks. The caller must hold the monitor's lock for the whole tick.
pub(crate) fn tick(monitor: &mut Monitor, now: i64, hook_timeout: Duration) -> TickOutcome {
    if let Some(dependency) = monitor.data().blocking_dependency().map(str::to_string) {
        debug!(monitor = %monitor.name(), dependency = %dependency, "skipped on dependency");
        monitor.data_mut().record_skip(Some(&dependency));
        return TickOutcome::DependencySkipped(dependency);
    }

    if !monitor.data_mut().should_run(now) {
        debug!(monitor = %monitor.name(), "throttled by minimum gap");
        monitor.data_mut().record_skip(None);
        return TickOutcome::Throttled;
    }

    monitor.run_test();
    monitor.attempt_recover(hook_timeout);
    monitor.run_recovered(hook_timeout);

    if monitor.data().is_passing() {
        TickOutcome::Passed
    } else {
        TickOutcome::Failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{FailCheck, NullCheck};
    use crate::models::{MonitorData, MonitorSettings, MonitorState};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn monitor(settings: MonitorSettings) -> Monitor {
        let data = MonitorData::new("web", "null", settings, "probe01");
        Monitor::attach(data, Box::new(NullCheck))
    }

    #[test]
    fn test_tick_blocked_by_dependency() {
        let mut m = monitor(MonitorSettings {
            dependencies: vec!["db".to_string()],
            ..MonitorSettings::default()
        });
        let outcome = tick(&mut m, 1_000, TIMEOUT);
        assert_eq!(outcome, TickOutcome::DependencySkipped("db".to_string()));
        assert!(!outcome.satisfies_dependents());
        assert_eq!(m.data().state(), MonitorState::Skipped);
        assert_eq!(m.data().skip_dependency(), Some("db"));
        // the gate was not consulted
        assert!(m.data().is_forced());
    }

    #[test]
    fn test_tick_throttled_by_gap() {
        let mut m = monitor(MonitorSettings {
            minimum_gap: 60,
            ..MonitorSettings::default()
        });
        assert_eq!(tick(&mut m, 1_000, TIMEOUT), TickOutcome::Passed);
        let outcome = tick(&mut m, 1_010, TIMEOUT);
        assert_eq!(outcome, TickOutcome::Throttled);
        assert!(outcome.satisfies_dependents());
        assert_eq!(m.data().tests_run(), 1);
        assert!(m.data().was_skipped());
    }

    #[test]
    fn test_tick_failure_within_tolerance_passes() {
        let data = MonitorData::new(
            "flaky",
            "fail",
            MonitorSettings {
                tolerance: 1,
                ..MonitorSettings::default()
            },
            "probe01",
        );
        let mut m = Monitor::attach(data, Box::new(FailCheck::new(5).unwrap()));
        assert_eq!(tick(&mut m, 1_000, TIMEOUT), TickOutcome::Passed);
        assert_eq!(tick(&mut m, 1_001, TIMEOUT), TickOutcome::Failed);
    }

    #[test]
    fn test_report_record() {
        let mut report = CycleReport::default();
        report.record("b".to_string(), TickOutcome::Passed);
        report.record("a".to_string(), TickOutcome::Passed);
        report.record("c".to_string(), TickOutcome::DependencySkipped("a".to_string()));
        report.sort();
        assert_eq!(report.passed, vec!["a", "b"]);
        assert_eq!(report.total(), 3);
    }
}
