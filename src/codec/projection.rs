//! One-way status projection for loggers and alert formatters.

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

use super::wire::tagged_timestamp_opt;
use crate::models::MonitorData;

/// Flat, derived view of a monitor. Not decodable back into a monitor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusProjection {
    /// First failure time without microseconds, or empty
    pub failed_at: String,
    pub name: String,
    pub host: String,
    pub is_remote: bool,
    pub downtime: String,
    pub uptime: String,
    /// Virtual fail count
    pub vfc: u32,
    pub info: String,
    pub description: String,
    pub recovery_info: String,
    pub recovered_info: String,
    #[serde(with = "tagged_timestamp_opt")]
    pub first_failure_time: Option<DateTime<Utc>>,
}

impl StatusProjection {
    pub fn new(data: &MonitorData, description: &str, local_host: &str, now: DateTime<Utc>) -> Self {
        Self {
            failed_at: format_datetime(data.first_failure_time()),
            name: data.name().to_string(),
            host: data.running_on().to_string(),
            is_remote: data.is_remote(local_host),
            downtime: data.downtime_display(now).to_string(),
            uptime: data.uptime_display(now).to_string(),
            vfc: data.virtual_fail_count(),
            info: data.last_result().to_string(),
            description: description.to_string(),
            recovery_info: data.recover_info().to_string(),
            recovered_info: data.recovered_info().to_string(),
            first_failure_time: data.first_failure_time(),
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS` without microseconds; empty when absent.
pub fn format_datetime(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|ts| ts.trunc_subsecs(0).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_datetime() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 58).unwrap() + Duration::microseconds(999_999);
        assert_eq!(format_datetime(Some(ts)), "2024-06-01 23:59:58");
        assert_eq!(format_datetime(None), "");
    }
}
