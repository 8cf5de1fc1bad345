//! Runtime monitor: serializable state plus the handles that cannot travel.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Span};

use crate::checks::Check;
use crate::codec::StatusProjection;
use crate::hooks::HookOutcome;
use crate::models::MonitorData;

/// A monitor as the orchestrator drives it.
///
/// Owns the [`MonitorData`] that crosses the wire, the check variant that
/// produces results, and a tracing span scoped to the monitor's name. The
/// span is never serialized; [`Monitor::attach`] re-creates it from the name.
pub struct Monitor {
    data: MonitorData,
    check: Box<dyn Check>,
    span: Span,
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("data", &self.data)
            .field("params", &self.check.params())
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Attach a check and a fresh logging span to monitor state.
    pub fn attach(data: MonitorData, check: Box<dyn Check>) -> Self {
        let span = info_span!("monitor", name = %data.name());
        Self { data, check, span }
    }

    /// Run the check once and record how long it took.
    pub fn run_test(&mut self) -> bool {
        let _entered = self.span.enter();
        let started = Instant::now();
        let passed = self.check.run_test(&mut self.data);
        let elapsed = started.elapsed();
        self.data.set_last_run_duration(elapsed.as_secs());
        debug!(
            passed,
            elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
            result = %self.data.last_result(),
            "test finished"
        );
        passed
    }

    pub fn attempt_recover(&mut self, timeout: Duration) -> Option<HookOutcome> {
        let _entered = self.span.enter();
        self.data.attempt_recover(timeout)
    }

    pub fn run_recovered(&mut self, timeout: Duration) -> Option<HookOutcome> {
        let _entered = self.span.enter();
        self.data.run_recovered(timeout)
    }

    pub fn describe(&self) -> String {
        self.check.describe()
    }

    pub fn params(&self) -> Vec<String> {
        self.check.params()
    }

    pub fn projection(&self, local_host: &str, now: DateTime<Utc>) -> StatusProjection {
        StatusProjection::new(&self.data, &self.describe(), local_host, now)
    }

    /// Replace the monitor's state with a transferred snapshot.
    ///
    /// The check variant is kept; the span is rebuilt for the incoming name.
    pub fn restore_state(&mut self, data: MonitorData) {
        self.span = info_span!("monitor", name = %data.name());
        self.data = data;
    }

    pub fn data(&self) -> &MonitorData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut MonitorData {
        &mut self.data
    }

    pub fn into_data(self) -> MonitorData {
        self.data
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn name(&self) -> &str {
        self.data.name()
    }
}
