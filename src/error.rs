//! Typed errors for the library boundary.
//!
//! Orchestration and CLI code wraps these in `anyhow::Error` with context.

use thiserror::Error;

/// A configuration problem for a single monitor.
///
/// Fatal to the monitor being constructed, never to the process.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("config option {key} is missing and is required")]
    Missing { key: String },

    #[error("config option {key} cannot be empty")]
    Empty { key: String },

    #[error("config option {key} needs to be an {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("config option {key} needs to be >= {minimum}")]
    BelowMinimum { key: String, minimum: f64 },

    #[error("config option {key} needs to be <= {maximum}")]
    AboveMaximum { key: String, maximum: f64 },

    #[error("config option {key} needs to be one of {allowed:?}")]
    NotAllowed { key: String, allowed: Vec<String> },

    #[error("unknown monitor type: {0}")]
    UnknownType(String),

    #[error("{0}")]
    Invalid(String),
}

/// Failure to encode or decode transferred monitor state.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not ASCII")]
    NotAscii,

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("unknown monitor state: {0}")]
    UnknownState(String),
}
