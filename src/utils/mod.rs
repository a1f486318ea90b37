pub mod constants;
pub mod config_loader;

pub use constants::*;
pub use config_loader::*;

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the unix epoch, zero if the clock is before it.
pub fn now_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}
