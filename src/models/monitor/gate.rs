//! Scheduling gate: decides whether a tick should execute the check.

use super::types::MonitorData;

impl MonitorData {
    /// Decide whether the check should run at `now` (epoch seconds).
    ///
    /// Healthy monitors are throttled to one run per `minimum_gap`. A monitor
    /// that is failing, even within tolerance, runs on every tick so recovery
    /// is noticed as early as possible. `last_run_at` only moves when this
    /// returns `true`.
    pub fn should_run(&mut self, now: i64) -> bool {
        if self.force_run {
            self.force_run = false;
            return self.authorize(now);
        }
        if self.settings.minimum_gap == 0 || self.error_count > 0 {
            return self.authorize(now);
        }
        match self.last_run_at {
            None => self.authorize(now),
            Some(last) if now.saturating_sub(last) >= gap_secs(self.settings.minimum_gap) => {
                self.authorize(now)
            }
            Some(_) => false,
        }
    }

    /// Make the next `should_run` call succeed regardless of timing.
    pub fn force_run(&mut self) {
        self.force_run = true;
    }

    pub fn is_forced(&self) -> bool {
        self.force_run
    }

    pub fn last_run_at(&self) -> Option<i64> {
        self.last_run_at
    }

    fn authorize(&mut self, now: i64) -> bool {
        self.last_run_at = Some(now);
        true
    }
}

fn gap_secs(gap: u64) -> i64 {
    i64::try_from(gap).unwrap_or(i64::MAX)
}
