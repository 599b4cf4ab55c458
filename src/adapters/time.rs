//! Wall-clock adapter.
//!
//! Implements [`TimePort`] for Debug Msg timestamps.
//!
//! - **`target_os = "espidf"`**: newlib's `gettimeofday`, which reads zero
//!   seconds plus uptime until something sets the RTC.
//! - **`not(target_os = "espidf")`**: the host clock.
//!
//! Both sides are reached through `std::time::SystemTime`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::app::ports::TimePort;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl TimePort for SystemClock {
    fn unix_time(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}
