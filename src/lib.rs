pub mod checks;
pub mod clock;
pub mod codec;
pub mod commands;
pub mod config;
pub mod error;
pub mod hooks;
pub mod models;
pub mod orchestrator;
pub mod runtime;
