//! Per-cycle dependency tracking.

use super::types::MonitorData;

impl MonitorData {
    /// Declared dependencies.
    pub fn dependencies(&self) -> &[String] {
        &self.settings.dependencies
    }

    /// Dependencies that have not succeeded yet in this cycle.
    pub fn remaining_dependencies(&self) -> &[String] {
        &self.remaining_dependencies
    }

    /// Start a new cycle with every declared dependency outstanding.
    pub fn reset_dependencies(&mut self) {
        self.remaining_dependencies = self.settings.dependencies.clone();
    }

    /// Mark `dependency` satisfied for this cycle. Unknown names are ignored.
    pub fn dependency_succeeded(&mut self, dependency: &str) {
        self.remaining_dependencies.retain(|d| d != dependency);
    }

    /// The first outstanding dependency, if the monitor is blocked.
    pub fn blocking_dependency(&self) -> Option<&str> {
        self.remaining_dependencies.first().map(String::as_str)
    }
}
