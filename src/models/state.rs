use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Display state of a monitor.
///
/// This is what alerting and status pages show, not the raw counters:
/// a monitor failing within its tolerance is still `Ok`.
///
/// State machine transitions:
/// - `Unknown` -> `Ok` | `Failed` | `Skipped`
/// - `Ok` <-> `Failed`
/// - any -> `Skipped` -> `Ok`
///
/// There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonitorState {
    /// No result has been recorded yet
    #[default]
    Unknown,
    /// Skipped this cycle (throttled or blocked by a dependency)
    Skipped,
    /// Passing, or failing within tolerance
    Ok,
    /// Failing beyond tolerance
    Failed,
}

impl MonitorState {
    /// Symbolic name used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            MonitorState::Unknown => "UNKNOWN",
            MonitorState::Skipped => "SKIPPED",
            MonitorState::Ok => "OK",
            MonitorState::Failed => "FAILED",
        }
    }

    pub fn all() -> &'static [MonitorState] {
        &[
            MonitorState::Unknown,
            MonitorState::Skipped,
            MonitorState::Ok,
            MonitorState::Failed,
        ]
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MonitorState {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MonitorState::all()
            .iter()
            .copied()
            .find(|state| state.name() == s)
            .ok_or_else(|| CodecError::UnknownState(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for state in MonitorState::all() {
            assert_eq!(state.name().parse::<MonitorState>().unwrap(), *state);
        }
    }

    #[test]
    fn test_unknown_name_rejected() {
        assert!("ok".parse::<MonitorState>().is_err());
        assert!("BROKEN".parse::<MonitorState>().is_err());
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(MonitorState::default(), MonitorState::Unknown);
    }
}
