use chrono::{DateTime, Duration, SubsecRound, Utc};
use tracing::debug;

use super::types::{MonitorData, MonitorSettings};
use crate::clock;
use crate::config::{OptionSpec, Options};
use crate::error::ConfigError;
use crate::models::state::MonitorState;
use crate::models::updown::UpDownTime;

/// Type tag for a monitor whose options name no check variant
pub const UNKNOWN_TYPE: &str = "unknown";

impl MonitorSettings {
    /// Resolve the common monitor options.
    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let tolerance = OptionSpec::new("tolerance")
            .default_value(0)
            .minimum(0.0)
            .int(options)?
            .unwrap_or(0);
        let minimum_gap = OptionSpec::new("gap")
            .default_value(0)
            .minimum(0.0)
            .int(options)?
            .unwrap_or(0);

        Ok(Self {
            tolerance: u32::try_from(tolerance)
                .map_err(|_| ConfigError::Invalid(format!("tolerance {tolerance} is too large")))?,
            minimum_gap: u64::try_from(minimum_gap).unwrap_or_default(),
            urgent: OptionSpec::new("urgent")
                .default_value(true)
                .boolean(options)?
                .unwrap_or(defaults.urgent),
            notify: OptionSpec::new("notify")
                .default_value(true)
                .boolean(options)?
                .unwrap_or(defaults.notify),
            remote_alerting: OptionSpec::new("remote_alert")
                .default_value(false)
                .boolean(options)?
                .unwrap_or(defaults.remote_alerting),
            group: OptionSpec::new("group")
                .default_value("default")
                .string(options)?
                .unwrap_or(defaults.group),
            dependencies: OptionSpec::new("depend")
                .string_list(options)?
                .unwrap_or_default(),
            recover_command: OptionSpec::new("recover_command").string(options)?,
            recovered_command: OptionSpec::new("recovered_command").string(options)?,
            failure_doc: OptionSpec::new("failure_doc").string(options)?,
        })
    }
}

impl MonitorData {
    /// Build a fresh monitor. It will run on its first opportunity.
    pub fn new(name: &str, type_tag: &str, settings: MonitorSettings, host: &str) -> Self {
        let remaining_dependencies = settings.dependencies.clone();
        Self {
            name: name.to_string(),
            type_tag: type_tag.to_string(),
            running_on: host.to_string(),
            settings,
            options: Options::new(),
            state: MonitorState::Unknown,
            error_count: 0,
            success_count: 0,
            tests_run: 0,
            last_error_count: 0,
            last_result: String::new(),
            failures: 0,
            last_failure_at: None,
            first_failure_at: None,
            uptime_start: None,
            last_update: None,
            unavailable_seconds: 0,
            first_load_at: clock::now(),
            skip_dependency: None,
            remaining_dependencies,
            recover_info: String::new(),
            recovered_info: String::new(),
            last_run_at: None,
            force_run: true,
            last_run_duration_secs: 0,
        }
    }

    /// Build a monitor from its raw option map.
    ///
    /// The `type` option selects the check variant and is recorded as the
    /// type tag; the map itself is kept so the check can be rebuilt after a
    /// state transfer.
    pub fn from_options(name: &str, options: &Options, host: &str) -> Result<Self, ConfigError> {
        let type_tag = OptionSpec::new("type")
            .default_value(UNKNOWN_TYPE)
            .disallow_empty()
            .string(options)?
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        let settings = MonitorSettings::from_options(options)?;

        let mut data = Self::new(name, &type_tag, settings, host);
        data.options = options.clone();
        Ok(data)
    }

    /// Record a failed test. Always returns `false`.
    pub fn record_failure(&mut self, message: &str) -> bool {
        self.record_failure_at(message, clock::now())
    }

    pub fn record_failure_at(&mut self, message: &str, now: DateTime<Utc>) -> bool {
        let now = stamp(now);
        self.error_count += 1;
        self.add_unavailable_seconds(now);
        self.last_update = Some(now);
        self.last_result = message.to_string();

        if self.virtual_fail_count() == 1 {
            self.first_failure_at = Some(now);
            self.last_failure_at = Some(now);
            self.failures += 1;
            self.state = MonitorState::Failed;
            debug!(monitor = %self.name, failures = self.failures, "failure crossed tolerance");
        }

        self.success_count = 0;
        self.tests_run += 1;
        self.uptime_start = None;
        false
    }

    /// Record a successful test. Always returns `true`.
    pub fn record_success(&mut self, message: &str) -> bool {
        self.record_success_at(message, clock::now())
    }

    pub fn record_success_at(&mut self, message: &str, now: DateTime<Utc>) -> bool {
        let now = stamp(now);
        if self.error_count > 0 {
            self.last_error_count = self.error_count;
        }
        if self.uptime_start.is_none() {
            self.uptime_start = Some(now);
        }
        self.add_unavailable_seconds(now);
        self.state = MonitorState::Ok;
        self.error_count = 0;
        self.last_update = Some(now);
        self.success_count += 1;
        self.tests_run += 1;
        self.last_result = message.to_string();
        true
    }

    /// Record that the monitor was skipped this cycle. Always returns `true`.
    ///
    /// A skip caused by a dependency is booked as a success first so it can
    /// never raise an alert. A plain skip (throttled by the gate) leaves the
    /// counters alone.
    pub fn record_skip(&mut self, blocking_dependency: Option<&str>) -> bool {
        self.record_skip_at(blocking_dependency, clock::now())
    }

    pub fn record_skip_at(&mut self, blocking_dependency: Option<&str>, now: DateTime<Utc>) -> bool {
        if let Some(dependency) = blocking_dependency {
            self.record_success_at("", now);
            self.skip_dependency = Some(dependency.to_string());
        }
        self.state = MonitorState::Skipped;
        true
    }

    fn add_unavailable_seconds(&mut self, now: DateTime<Utc>) {
        if let Some(last_update) = self.last_update {
            if self.success_count == 0 {
                let delta = (now - last_update).num_seconds().max(0);
                self.unavailable_seconds += delta.unsigned_abs();
            }
        }
    }

    /// Failures beyond tolerance.
    pub fn virtual_fail_count(&self) -> u32 {
        self.error_count.saturating_sub(self.settings.tolerance)
    }

    /// The virtual fail count of the streak that ended at the last recovery.
    pub fn last_virtual_fail_count(&self) -> u32 {
        self.last_error_count.saturating_sub(self.settings.tolerance)
    }

    /// True unless enough consecutive failures have exceeded the tolerance.
    pub fn is_passing(&self) -> bool {
        self.virtual_fail_count() == 0
    }

    /// True on exactly the failure that crossed the tolerance.
    pub fn is_first_failure(&self) -> bool {
        u64::from(self.error_count) == u64::from(self.settings.tolerance) + 1
    }

    /// True on the first success after a failure that crossed the tolerance.
    pub fn just_recovered(&self) -> bool {
        self.last_virtual_fail_count() > 0
            && self.success_count == 1
            && self.state != MonitorState::Skipped
    }

    /// Fraction of the time since first load the monitor was available.
    ///
    /// Zero until at least two tests have run.
    pub fn availability(&self, now: DateTime<Utc>) -> f64 {
        if self.tests_run <= 1 {
            return 0.0;
        }
        let total = (now - self.first_load_at).num_milliseconds() as f64 / 1000.0;
        if total <= 0.0 {
            return 0.0;
        }
        1.0 - (self.unavailable_seconds as f64 / total)
    }

    /// Length of the current success streak, if there is one.
    pub fn uptime(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.uptime_start.map(|start| now - start)
    }

    pub fn uptime_display(&self, now: DateTime<Utc>) -> UpDownTime {
        self.uptime(now)
            .map(UpDownTime::from_duration)
            .unwrap_or_default()
    }

    /// Time since the most recent tolerance-crossing failure.
    pub fn downtime(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.first_failure_at.map(|failed_at| now - failed_at)
    }

    pub fn downtime_display(&self, now: DateTime<Utc>) -> UpDownTime {
        self.downtime(now)
            .map(UpDownTime::from_duration)
            .unwrap_or_default()
    }

    /// Whether the check last ran somewhere other than `local_host`.
    pub fn is_remote(&self, local_host: &str) -> bool {
        self.running_on != local_host
    }

    pub fn was_skipped(&self) -> bool {
        self.state == MonitorState::Skipped
    }

    /// Reject negative gaps; the gate only ever sees a valid value.
    pub fn set_minimum_gap(&mut self, gap: i64) -> Result<(), ConfigError> {
        let gap = u64::try_from(gap)
            .map_err(|_| ConfigError::Invalid("gap must be at least 0".to_string()))?;
        self.settings.minimum_gap = gap;
        Ok(())
    }

    /// Replace the declared dependencies and reset the working set.
    pub fn set_dependencies(&mut self, dependencies: Vec<String>) {
        self.settings.dependencies = dependencies;
        self.reset_dependencies();
    }

    pub fn set_running_on(&mut self, host: &str) {
        self.running_on = host.to_string();
    }

    pub(crate) fn set_last_run_duration(&mut self, secs: u64) {
        self.last_run_duration_secs = secs;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn group(&self) -> &str {
        &self.settings.group
    }

    pub fn running_on(&self) -> &str {
        &self.running_on
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Consecutive successes; zero before any test has run.
    pub fn success_count(&self) -> u32 {
        if self.tests_run == 0 {
            return 0;
        }
        self.success_count
    }

    pub fn tests_run(&self) -> u64 {
        self.tests_run
    }

    pub fn last_error_count(&self) -> u32 {
        self.last_error_count
    }

    pub fn last_result(&self) -> &str {
        &self.last_result
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn first_failure_time(&self) -> Option<DateTime<Utc>> {
        self.first_failure_at
    }

    pub fn last_failure_time(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }

    pub fn uptime_start(&self) -> Option<DateTime<Utc>> {
        self.uptime_start
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn unavailable_seconds(&self) -> u64 {
        self.unavailable_seconds
    }

    pub fn first_load_at(&self) -> DateTime<Utc> {
        self.first_load_at
    }

    pub fn skip_dependency(&self) -> Option<&str> {
        self.skip_dependency.as_deref()
    }

    pub fn recover_info(&self) -> &str {
        &self.recover_info
    }

    pub fn recovered_info(&self) -> &str {
        &self.recovered_info
    }

    pub fn last_run_duration_secs(&self) -> u64 {
        self.last_run_duration_secs
    }
}

// Stored timestamps keep the six fractional digits the wire form carries.
fn stamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now.trunc_subsecs(6)
}
