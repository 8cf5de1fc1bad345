pub mod monitor;
pub mod state;
pub mod updown;

pub use monitor::{MonitorData, MonitorSettings};
pub use state::MonitorState;
pub use updown::UpDownTime;
