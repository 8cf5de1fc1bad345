use tracing::info;

use super::Check;
use crate::config::{OptionSpec, Options};
use crate::error::ConfigError;
use crate::models::MonitorData;

/// Fails `interval` times, then succeeds once, and repeats.
///
/// Useful for exercising alerting and recovery hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailCheck {
    interval: u32,
}

impl FailCheck {
    pub const TYPE: &'static str = "fail";
    pub const DEFAULT_INTERVAL: u32 = 5;

    pub fn new(interval: u32) -> Result<Self, ConfigError> {
        if interval == 0 {
            return Err(ConfigError::BelowMinimum {
                key: "interval".to_string(),
                minimum: 1.0,
            });
        }
        Ok(Self { interval })
    }

    pub fn from_options(options: &Options) -> Result<Self, ConfigError> {
        let interval = OptionSpec::new("interval")
            .default_value(i64::from(Self::DEFAULT_INTERVAL))
            .minimum(1.0)
            .int(options)?
            .unwrap_or(i64::from(Self::DEFAULT_INTERVAL));
        let interval = u32::try_from(interval)
            .map_err(|_| ConfigError::Invalid(format!("interval {interval} is too large")))?;
        Self::new(interval)
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}

impl Check for FailCheck {
    fn run_test(&mut self, data: &mut MonitorData) -> bool {
        let error_count = data.error_count();
        info!(
            error_count,
            interval = self.interval,
            remainder = error_count % self.interval,
            "fail check"
        );
        if error_count == 0 || error_count % self.interval != 0 {
            data.record_failure("This monitor always fails.")
        } else {
            data.record_success("")
        }
    }

    fn describe(&self) -> String {
        "A monitor which always fails.".to_string()
    }

    fn params(&self) -> Vec<String> {
        vec![self.interval.to_string()]
    }
}

/// Always succeeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullCheck;

impl NullCheck {
    pub const TYPE: &'static str = "null";
}

impl Check for NullCheck {
    fn run_test(&mut self, data: &mut MonitorData) -> bool {
        data.record_success("")
    }

    fn params(&self) -> Vec<String> {
        Vec::new()
    }
}
