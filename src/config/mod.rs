//! Configuration: the option resolver monitors are built from, and the
//! agent's TOML config file.

mod file;
pub mod options;

pub use file::{AgentConfig, AgentSettings, DEFAULT_HOOK_TIMEOUT_SECS, DEFAULT_INTERVAL_SECS};
pub use options::{parse_bool, OptionKind, OptionSpec, OptionValue, Options};
