//! Boot sequence: the only code that advances the device mode.
//!
//! The caller performs the static boot work (mount storage, load settings)
//! while the mode is BOOTING, then calls [`BootSequence::enter_management`]
//! and [`BootSequence::run_management_window`]:
//!
//! 1. enter MANAGEMENT (wakes dispatcher handlers waiting on boot);
//! 2. dwell for `management_dwell_ms`;
//! 3. while the hold latch is set, stay put, re-checking every
//!    `hold_poll_interval_ms` (or immediately on release);
//! 4. enter RUNNING.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::{DeviceMode, DeviceState, TransitionError};
use crate::app::ports::{ConfigPort, SettingsPort};
use crate::config::NodeConfig;
use crate::settings::SettingsBlock;

/// Timing knobs for the management window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootTiming {
    pub management_dwell: Duration,
    pub hold_poll_interval: Duration,
}

impl From<&NodeConfig> for BootTiming {
    fn from(cfg: &NodeConfig) -> Self {
        Self {
            management_dwell: Duration::from_millis(u64::from(cfg.management_dwell_ms)),
            hold_poll_interval: Duration::from_millis(u64::from(cfg.hold_poll_interval_ms)),
        }
    }
}

pub struct BootSequence {
    state: Arc<DeviceState>,
    timing: BootTiming,
}

impl BootSequence {
    pub fn new(state: Arc<DeviceState>, timing: BootTiming) -> Self {
        Self { state, timing }
    }

    /// Static boot work is done: BOOTING → MANAGEMENT.
    pub fn enter_management(&self) -> Result<(), TransitionError> {
        self.state.advance(DeviceMode::Management)
    }

    /// Dwell in MANAGEMENT, honour the hold latch, then → RUNNING.
    ///
    /// Blocks for as long as the latch stays set.  The latch is normally
    /// set by `Erase Log` / `Read Log`, which end in a reboot, so in practice
    /// this call then never returns.
    pub fn run_management_window(&self) -> Result<(), TransitionError> {
        info!(
            "Boot: management window open ({} ms)",
            self.timing.management_dwell.as_millis()
        );
        std::thread::sleep(self.timing.management_dwell);

        while self.state.hold_requested() {
            debug!("Boot: holding in management");
            self.state
                .wait_for_hold_release(self.timing.hold_poll_interval);
        }

        self.state.advance(DeviceMode::Running)?;
        info!("Boot: complete, node running");
        Ok(())
    }
}

// ── Static boot work ─────────────────────────────────────────

/// Load the settings block, falling back to defaults if the stored one is
/// unreadable, then write it back so flash always holds a valid block.
pub fn restore_settings<P: SettingsPort>(store: &mut P) -> SettingsBlock {
    let settings = store.load_settings().unwrap_or_else(|e| {
        warn!("Boot: stored settings unusable ({}), using defaults", e);
        SettingsBlock::default()
    });
    if let Err(e) = store.save_settings(&settings) {
        warn!("Boot: could not persist settings: {}", e);
    }
    settings
}

/// Load node tunables, falling back to defaults if unreadable.
pub fn restore_config<P: ConfigPort>(store: &P) -> NodeConfig {
    store.load_config().unwrap_or_else(|e| {
        warn!("Boot: stored config unusable ({}), using defaults", e);
        NodeConfig::default()
    })
}
