mod dependencies;
mod gate;
mod methods;
mod types;


pub use methods::UNKNOWN_TYPE;
pub use types::{MonitorData, MonitorSettings};
