use chrono::Duration;
use std::fmt;

/// An uptime or downtime split into days, hours, minutes and seconds.
///
/// Displays as `days+HH:MM:SS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpDownTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl UpDownTime {
    pub fn new(days: i64, hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
            seconds,
        }
    }

    /// Decompose an elapsed duration. Negative durations count as zero.
    pub fn from_duration(elapsed: Duration) -> Self {
        let total = elapsed.num_seconds().max(0);
        let (days, rest) = (total / 86_400, total % 86_400);
        let (hours, rest) = (rest / 3_600, rest % 3_600);
        let (minutes, seconds) = (rest / 60, rest % 60);
        Self::new(days, hours, minutes, seconds)
    }
}

impl fmt::Display for UpDownTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}+{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}
