//! State-transfer codec and status projection.
//!
//! Two separate concerns:
//! - round-trip transfer of a monitor's full state ([`encode_state`] /
//!   [`decode_state`]), used to merge remote agents into an aggregator
//! - a one-way [`StatusProjection`] for loggers and alerters

mod projection;
mod transfer;
pub mod wire;


pub use projection::{format_datetime, StatusProjection};
pub use transfer::{decode_state, decode_states, decode_value, encode_state, encode_states};
pub use wire::{TaggedValue, WireValue, DATETIME_TAG, MONITORSTATE_TAG};
