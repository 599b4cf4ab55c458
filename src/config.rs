//! Node configuration parameters
//!
//! Tunables for the control plane itself (boot timing, reboot grace, log
//! location).  Radio parameters live in the [`SettingsBlock`](crate::settings::SettingsBlock),
//! which the operator edits over the serial link; these values only change
//! by writing a new blob through the [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Control-plane configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Boot ---
    /// Time spent in MANAGEMENT before moving to RUNNING (milliseconds)
    pub management_dwell_ms: u32,
    /// Re-check interval while the hold-in-management latch is set (milliseconds)
    pub hold_poll_interval_ms: u32,

    // --- Reboot ---
    /// Pause between draining the serial mailbox and restarting (milliseconds)
    pub reboot_grace_ms: u32,

    // --- Storage ---
    /// Log file name, relative to the storage root
    pub log_file: heapless::String<32>,

    // --- Logging ---
    /// Maximum log level forwarded as Debug Msg ("error" … "trace")
    pub log_level: heapless::String<8>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut log_file = heapless::String::new();
        let _ = log_file.push_str("logfile.json");
        let mut log_level = heapless::String::new();
        let _ = log_level.push_str("info");
        Self {
            management_dwell_ms: 2000,
            hold_poll_interval_ms: 5000,
            reboot_grace_ms: 200,
            log_file,
            log_level,
        }
    }
}

impl NodeConfig {
    /// Parsed `log_level`, falling back to `Info` for unknown names.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.management_dwell_ms > 60_000 {
            return Err(ConfigError::ValidationFailed(
                "management_dwell_ms must be 0 to 60000",
            ));
        }
        if !(10..=60_000).contains(&self.hold_poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "hold_poll_interval_ms must be 10 to 60000",
            ));
        }
        if self.reboot_grace_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "reboot_grace_ms must be 0 to 10000",
            ));
        }
        if self.log_file.is_empty()
            || self.log_file.contains('/')
            || self.log_file.starts_with('.')
        {
            return Err(ConfigError::ValidationFailed(
                "log_file must be a bare file name",
            ));
        }
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::ValidationFailed("log_level is not a level name"));
        }
        Ok(())
    }
}
