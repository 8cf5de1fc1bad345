//! Recovery hook executor.
//!
//! Two independent external commands per monitor:
//! - `recover_command`: fired once when the monitor first fails past tolerance
//! - `recovered_command`: fired once on the first success after that
//!
//! Commands are split on whitespace and run without a shell, bounded by a
//! timeout. Whatever happens is recorded as text on the monitor.

mod executor;
mod recovery;

pub use executor::{run_command, split_command, HookOutcome};
