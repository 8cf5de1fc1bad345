use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::wire::{tagged_state, tagged_timestamp, tagged_timestamp_opt};
use crate::config::Options;
use crate::models::state::MonitorState;

/// Per-monitor configuration, fixed once the monitor is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Consecutive failures absorbed before the monitor counts as failed
    pub tolerance: u32,
    /// Minimum seconds between runs while healthy
    pub minimum_gap: u64,
    pub urgent: bool,
    pub notify: bool,
    /// Alert from the remote agent rather than the aggregator
    pub remote_alerting: bool,
    pub group: String,
    /// Names of monitors that must succeed first in each cycle
    pub dependencies: Vec<String>,
    /// Run once when the monitor first fails beyond tolerance
    pub recover_command: Option<String>,
    /// Run once when the monitor recovers
    pub recovered_command: Option<String>,
    pub failure_doc: Option<String>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tolerance: 0,
            minimum_gap: 0,
            urgent: true,
            notify: true,
            remote_alerting: false,
            group: "default".to_string(),
            dependencies: Vec::new(),
            recover_command: None,
            recovered_command: None,
            failure_doc: None,
        }
    }
}

/// Serializable state of one monitor: identity, settings and runtime counters.
///
/// Everything here crosses the wire when a remote agent reports to an
/// aggregator. Non-serializable resources live on
/// [`crate::runtime::Monitor`], which wraps this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorData {
    pub(crate) name: String,
    pub(crate) type_tag: String,
    /// Host that last executed the check
    pub(crate) running_on: String,
    pub(crate) settings: MonitorSettings,
    /// Raw options the monitor was built from, used to rebuild its check
    pub(crate) options: Options,

    #[serde(with = "tagged_state")]
    pub(crate) state: MonitorState,
    /// Consecutive failures since the last success
    pub(crate) error_count: u32,
    /// Consecutive successes since the last failure
    pub(crate) success_count: u32,
    pub(crate) tests_run: u64,
    /// `error_count` captured at the most recent recovery
    pub(crate) last_error_count: u32,
    pub(crate) last_result: String,
    /// Lifetime count of tolerance-crossing failure episodes
    pub(crate) failures: u64,
    #[serde(with = "tagged_timestamp_opt")]
    pub(crate) last_failure_at: Option<DateTime<Utc>>,
    #[serde(with = "tagged_timestamp_opt")]
    pub(crate) first_failure_at: Option<DateTime<Utc>>,
    #[serde(with = "tagged_timestamp_opt")]
    pub(crate) uptime_start: Option<DateTime<Utc>>,
    #[serde(with = "tagged_timestamp_opt")]
    pub(crate) last_update: Option<DateTime<Utc>>,
    pub(crate) unavailable_seconds: u64,
    #[serde(with = "tagged_timestamp")]
    pub(crate) first_load_at: DateTime<Utc>,
    pub(crate) skip_dependency: Option<String>,
    /// Dependencies not yet satisfied in the current cycle
    pub(crate) remaining_dependencies: Vec<String>,
    pub(crate) recover_info: String,
    pub(crate) recovered_info: String,
    /// Epoch seconds of the last run the gate authorized
    pub(crate) last_run_at: Option<i64>,
    pub(crate) force_run: bool,
    pub(crate) last_run_duration_secs: u64,
}
