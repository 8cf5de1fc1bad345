use std::collections::BTreeMap;
use std::fmt;

use super::builtin::{FailCheck, NullCheck};
use super::Check;
use crate::config::Options;
use crate::error::ConfigError;
use crate::models::monitor::UNKNOWN_TYPE;
use crate::models::MonitorData;
use crate::runtime::Monitor;

/// Builds a check variant from a monitor's raw options.
pub type CheckConstructor = fn(&Options) -> Result<Box<dyn Check>, ConfigError>;

/// Type tag → constructor map.
///
/// Registration happens once at startup; lookups are read-only afterwards.
#[derive(Clone, Default)]
pub struct CheckRegistry {
    constructors: BTreeMap<String, CheckConstructor>,
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckRegistry")
            .field("types", &self.types())
            .finish()
    }
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the `null` and `fail` variants.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(NullCheck::TYPE.to_string(), |_| {
            Ok(Box::new(NullCheck))
        });
        registry
            .constructors
            .insert(FailCheck::TYPE.to_string(), |options| {
                Ok(Box::new(FailCheck::from_options(options)?))
            });
        registry
    }

    /// Register a variant under `type_tag`.
    ///
    /// The reserved tag `unknown` and tags already taken are rejected.
    pub fn register(
        &mut self,
        type_tag: &str,
        constructor: CheckConstructor,
    ) -> Result<(), ConfigError> {
        if type_tag == UNKNOWN_TYPE {
            return Err(ConfigError::Invalid(format!(
                "monitor type {type_tag} is reserved"
            )));
        }
        if self.constructors.contains_key(type_tag) {
            return Err(ConfigError::Invalid(format!(
                "monitor type {type_tag} is already registered"
            )));
        }
        self.constructors.insert(type_tag.to_string(), constructor);
        Ok(())
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.constructors.contains_key(type_tag)
    }

    pub fn types(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Construct the check variant for `type_tag`.
    pub fn create_check(
        &self,
        type_tag: &str,
        options: &Options,
    ) -> Result<Box<dyn Check>, ConfigError> {
        let constructor = self
            .constructors
            .get(type_tag)
            .ok_or_else(|| ConfigError::UnknownType(type_tag.to_string()))?;
        constructor(options)
    }

    /// Build a runtime monitor from its configured options.
    pub fn build(
        &self,
        name: &str,
        options: &Options,
        local_host: &str,
    ) -> Result<Monitor, ConfigError> {
        let data = MonitorData::from_options(name, options, local_host)?;
        let check = self.create_check(data.type_tag(), options)?;
        Ok(Monitor::attach(data, check))
    }

    /// Rebuild a runtime monitor around transferred state.
    ///
    /// The check is reconstructed from the options the state carries; the
    /// state itself is installed untouched.
    pub fn restore(&self, data: MonitorData) -> Result<Monitor, ConfigError> {
        let check = self.create_check(data.type_tag(), data.options())?;
        Ok(Monitor::attach(data, check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MonitorSettings;

    fn options(pairs: &[(&str, &str)]) -> Options {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_builtins_registered() {
        let registry = CheckRegistry::with_builtins();
        assert_eq!(registry.types(), vec!["fail", "null"]);
        assert!(registry.contains("null"));
        assert!(!registry.contains(UNKNOWN_TYPE));
    }

    #[test]
    fn test_register_rejects_reserved_and_duplicate() {
        let mut registry = CheckRegistry::with_builtins();
        let ctor: CheckConstructor = |_| Ok(Box::new(NullCheck));

        assert!(registry.register(UNKNOWN_TYPE, ctor).is_err());
        assert!(registry.register("null", ctor).is_err());
        assert!(registry.register("noop", ctor).is_ok());
        assert!(registry.contains("noop"));
    }

    #[test]
    fn test_build_from_options() {
        let registry = CheckRegistry::with_builtins();
        let monitor = registry
            .build("flaky", &options(&[("type", "fail"), ("interval", "2")]), "probe01")
            .unwrap();

        assert_eq!(monitor.data().name(), "flaky");
        assert_eq!(monitor.data().type_tag(), "fail");
        assert_eq!(monitor.params(), vec!["2"]);
    }

    #[test]
    fn test_build_without_type_is_rejected() {
        let registry = CheckRegistry::with_builtins();
        let err = registry
            .build("mystery", &Options::new(), "probe01")
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownType(UNKNOWN_TYPE.to_string()));

        let err = registry
            .build("mystery", &options(&[("type", "ping")]), "probe01")
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown monitor type: ping");
    }

    #[test]
    fn test_build_rejects_bad_settings() {
        let registry = CheckRegistry::with_builtins();
        let result = registry.build(
            "web",
            &options(&[("type", "null"), ("tolerance", "-1")]),
            "probe01",
        );
        assert!(matches!(result, Err(ConfigError::BelowMinimum { .. })));
    }

    #[test]
    fn test_restore_uses_carried_options() {
        let registry = CheckRegistry::with_builtins();
        let original = registry
            .build("flaky", &options(&[("type", "fail"), ("interval", "7")]), "remote01")
            .unwrap();

        let restored = registry.restore(original.data().clone()).unwrap();
        assert_eq!(restored.params(), vec!["7"]);
        assert_eq!(restored.data(), original.data());
    }

    #[test]
    fn test_restore_unknown_type_fails() {
        let registry = CheckRegistry::with_builtins();
        let data = MonitorData::new("x", "ping", MonitorSettings::default(), "remote01");
        assert!(matches!(
            registry.restore(data),
            Err(ConfigError::UnknownType(_))
        ));
    }
}
