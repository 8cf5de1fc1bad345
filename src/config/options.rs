//! Typed extraction and validation of untyped monitor options.
//!
//! Option maps come from the agent config file with every value flattened to a
//! string. An [`OptionSpec`] describes one key (default, range, allowed values,
//! requiredness) and the terminal method picks the type it is coerced to.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Untyped option mapping for a single monitor.
pub type Options = BTreeMap<String, String>;

/// The coercion applied to a raw option string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Str,
    Int,
    Float,
    Bool,
    StrList,
    IntList,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKind::Str => write!(f, "str"),
            OptionKind::Int => write!(f, "int"),
            OptionKind::Float => write!(f, "float"),
            OptionKind::Bool => write!(f, "bool"),
            OptionKind::StrList => write!(f, "[str]"),
            OptionKind::IntList => write!(f, "[int]"),
        }
    }
}

/// A resolved option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StrList(Vec<String>),
    IntList(Vec<i64>),
}

impl OptionValue {
    pub fn into_string(self) -> Option<String> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn into_str_list(self) -> Option<Vec<String>> {
        match self {
            OptionValue::StrList(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_int_list(self) -> Option<Vec<i64>> {
        match self {
            OptionValue::IntList(list) => Some(list),
            _ => None,
        }
    }

    /// String forms compared against an allowed-values list.
    fn allowed_repr(&self) -> Vec<String> {
        match self {
            OptionValue::Str(s) => vec![s.clone()],
            OptionValue::Int(i) => vec![i.to_string()],
            OptionValue::Float(f) => vec![f.to_string()],
            OptionValue::Bool(b) => vec![b.to_string()],
            OptionValue::StrList(list) => list.clone(),
            OptionValue::IntList(list) => list.iter().map(i64::to_string).collect(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Str(value.to_string())
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        OptionValue::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        OptionValue::Int(i64::from(value))
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        OptionValue::Float(value)
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(value: Vec<String>) -> Self {
        OptionValue::StrList(value)
    }
}

/// Declarative description of one option lookup.
#[derive(Debug, Clone)]
pub struct OptionSpec<'a> {
    key: &'a str,
    default: Option<OptionValue>,
    minimum: Option<f64>,
    maximum: Option<f64>,
    allowed: Option<&'a [&'a str]>,
    required: bool,
    allow_empty: bool,
}

impl<'a> OptionSpec<'a> {
    pub fn new(key: &'a str) -> Self {
        Self {
            key,
            default: None,
            minimum: None,
            maximum: None,
            allowed: None,
            required: false,
            allow_empty: true,
        }
    }

    pub fn default_value(mut self, value: impl Into<OptionValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn minimum(mut self, minimum: f64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn allowed(mut self, allowed: &'a [&'a str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn disallow_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    /// Resolve the option, coercing a present raw value to `kind`.
    ///
    /// Defaults are returned as given, without coercion. Returns `Ok(None)` for
    /// an absent optional key with no default.
    pub fn resolve(
        &self,
        options: &Options,
        kind: OptionKind,
    ) -> Result<Option<OptionValue>, ConfigError> {
        let value = match options.get(self.key) {
            Some(raw) => self.coerce(raw, kind)?,
            None => match &self.default {
                Some(default) => default.clone(),
                None if self.required => {
                    return Err(ConfigError::Missing {
                        key: self.key.to_string(),
                    })
                }
                None => return Ok(None),
            },
        };

        if let Some(allowed) = self.allowed {
            let ok = value
                .allowed_repr()
                .iter()
                .all(|v| allowed.contains(&v.as_str()));
            if !ok {
                return Err(ConfigError::NotAllowed {
                    key: self.key.to_string(),
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                });
            }
        }

        Ok(Some(value))
    }

    pub fn string(&self, options: &Options) -> Result<Option<String>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::Str)?
            .and_then(OptionValue::into_string))
    }

    pub fn int(&self, options: &Options) -> Result<Option<i64>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::Int)?
            .and_then(|v| v.as_int()))
    }

    pub fn float(&self, options: &Options) -> Result<Option<f64>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::Float)?
            .and_then(|v| v.as_float()))
    }

    pub fn boolean(&self, options: &Options) -> Result<Option<bool>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::Bool)?
            .and_then(|v| v.as_bool()))
    }

    pub fn string_list(&self, options: &Options) -> Result<Option<Vec<String>>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::StrList)?
            .and_then(OptionValue::into_str_list))
    }

    pub fn int_list(&self, options: &Options) -> Result<Option<Vec<i64>>, ConfigError> {
        Ok(self
            .resolve(options, OptionKind::IntList)?
            .and_then(OptionValue::into_int_list))
    }

    fn coerce(&self, raw: &str, kind: OptionKind) -> Result<OptionValue, ConfigError> {
        match kind {
            OptionKind::Str => {
                if raw.is_empty() && !self.allow_empty {
                    return Err(ConfigError::Empty {
                        key: self.key.to_string(),
                    });
                }
                Ok(OptionValue::Str(raw.to_string()))
            }
            OptionKind::Int => {
                let value: i64 = raw.trim().parse().map_err(|_| self.wrong_type("int"))?;
                self.check_range(value as f64)?;
                Ok(OptionValue::Int(value))
            }
            OptionKind::Float => {
                let value: f64 = raw.trim().parse().map_err(|_| self.wrong_type("float"))?;
                self.check_range(value)?;
                Ok(OptionValue::Float(value))
            }
            OptionKind::Bool => Ok(OptionValue::Bool(parse_bool(raw))),
            OptionKind::StrList => Ok(OptionValue::StrList(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
            OptionKind::IntList => raw
                .split(',')
                .map(|s| s.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map(OptionValue::IntList)
                .map_err(|_| self.wrong_type("list of int[int,...]")),
        }
    }

    fn check_range(&self, value: f64) -> Result<(), ConfigError> {
        if let Some(minimum) = self.minimum {
            if value < minimum {
                return Err(ConfigError::BelowMinimum {
                    key: self.key.to_string(),
                    minimum,
                });
            }
        }
        if let Some(maximum) = self.maximum {
            if value > maximum {
                return Err(ConfigError::AboveMaximum {
                    key: self.key.to_string(),
                    maximum,
                });
            }
        }
        Ok(())
    }

    fn wrong_type(&self, expected: &'static str) -> ConfigError {
        ConfigError::WrongType {
            key: self.key.to_string(),
            expected,
        }
    }
}

/// `"1"`, `"true"` and `"yes"` (any case) are true; everything else is false.
pub fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}
