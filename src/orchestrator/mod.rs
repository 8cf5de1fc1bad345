//! Cycle driver for a set of monitors.
//!
//! Each cycle:
//! - resets every monitor's remaining dependencies
//! - walks the dependency waves, running each wave's monitors in parallel
//! - skips a monitor whose upstream did not succeed, throttles one the gate
//!   refuses, otherwise runs its test and then its recovery hooks
//! - reports success to dependents once a monitor passed or was throttled

mod cycle;
mod graph;
mod set;


pub use cycle::{CycleReport, TickOutcome};
pub use graph::{dependency_waves, detect_cycles, unknown_dependencies, DependencyGraph};
pub use set::MonitorSet;
