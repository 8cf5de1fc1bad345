//! Agent configuration file (TOML).
//!
//! ```toml
//! [agent]
//! interval_secs = 60
//! hook_timeout_secs = 30
//!
//! [monitors.db]
//! type = "null"
//!
//! [monitors.web]
//! type = "fail"
//! depend = ["db"]
//! tolerance = 2
//! ```
//!
//! Every monitor table is flattened into an [`Options`] map so the monitor
//! itself only ever sees strings, the same as an INI-style source would give.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::options::Options;
use crate::clock::short_hostname;

/// Default seconds between scheduling cycles
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Default upper bound on a recovery hook's run time
pub const DEFAULT_HOOK_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub monitors: BTreeMap<String, toml::Table>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub interval_secs: u64,
    pub hook_timeout_secs: u64,
    /// Overrides the detected short hostname
    pub hostname: Option<String>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
            hook_timeout_secs: DEFAULT_HOOK_TIMEOUT_SECS,
            hostname: None,
        }
    }
}

impl AgentConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        if config.agent.interval_secs == 0 {
            bail!("agent.interval_secs must be at least 1");
        }
        Ok(config)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.agent.interval_secs)
    }

    pub fn hook_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.hook_timeout_secs)
    }

    pub fn hostname(&self) -> String {
        self.agent.hostname.clone().unwrap_or_else(short_hostname)
    }

    /// Flattened option maps, keyed by monitor name.
    pub fn monitor_options(&self) -> Result<BTreeMap<String, Options>> {
        let mut result = BTreeMap::new();
        for (name, table) in &self.monitors {
            let mut options = Options::new();
            for (key, value) in table {
                let flat = flatten_value(value)
                    .with_context(|| format!("monitor {name}: option {key}"))?;
                options.insert(key.clone(), flat);
            }
            result.insert(name.clone(), options);
        }
        Ok(result)
    }
}

fn flatten_value(value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        toml::Value::Boolean(b) => Ok(b.to_string()),
        toml::Value::Datetime(dt) => Ok(dt.to_string()),
        toml::Value::Array(items) => {
            let parts = items.iter().map(flatten_value).collect::<Result<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        toml::Value::Table(_) => bail!("nested tables are not supported"),
    }
}
