//! Wall-clock and host helpers shared by the state machine and the gate.

use chrono::{DateTime, SubsecRound, Utc};

/// Current UTC time truncated to microseconds.
///
/// Transferred timestamps carry six fractional digits, so every timestamp the
/// state machine stores is captured at that precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Current time as epoch seconds, the unit used by the scheduling gate.
pub fn epoch_secs() -> i64 {
    Utc::now().timestamp()
}

/// The machine name without any domain suffix.
pub fn short_hostname() -> String {
    let full = nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    short_name(&full)
}

fn short_name(host: &str) -> String {
    host.split('.').next().unwrap_or_default().to_string()
}
