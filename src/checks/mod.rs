//! Check variants: the test logic behind each monitor type.
//!
//! A variant only decides success or failure and records it on the
//! [`MonitorData`] it is handed. Counters, gating and hooks belong to the
//! state machine.

mod builtin;
mod registry;

pub use builtin::{FailCheck, NullCheck};
pub use registry::{CheckConstructor, CheckRegistry};

use crate::models::MonitorData;

/// Text reported by variants that do not describe themselves
pub const DEFAULT_DESCRIPTION: &str = "(Monitor did not write an auto-biography.)";

/// Capability set every monitor type implements.
pub trait Check: Send {
    /// Run the test once, recording the result through
    /// [`MonitorData::record_success`] or [`MonitorData::record_failure`].
    ///
    /// Returns the recorded outcome.
    fn run_test(&mut self, data: &mut MonitorData) -> bool;

    /// Human-readable description of what is being checked.
    fn describe(&self) -> String {
        DEFAULT_DESCRIPTION.to_string()
    }

    /// The variant's configured parameters, in declaration order.
    fn params(&self) -> Vec<String>;
}
