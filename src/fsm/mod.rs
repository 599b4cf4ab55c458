//! Device mode state machine.
//!
//! ```text
//!  BOOTING ──[storage mounted, settings loaded]──▶ MANAGEMENT
//!                                                     │
//!                              [dwell elapsed, hold latch clear]
//!                                                     ▼
//!                                                  RUNNING
//! ```
//!
//! Transitions are monotonic within one boot cycle; the only way back to
//! BOOTING is a reboot.  The mode and the hold-in-management latch live in
//! one [`DeviceState`] shared (via `Arc`) between the boot sequence, which
//! advances the mode, and the dispatcher, which reads it and sets the latch.
//!
//! Waiters block on a condition variable instead of spinning: every mode
//! change and every latch release notifies all of them.

pub mod boot;

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::info;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum DeviceMode {
    Booting = 0,
    Management = 1,
    Running = 2,
}

impl DeviceMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Booting => "BOOTING",
            Self::Management => "MANAGEMENT",
            Self::Running => "RUNNING",
        }
    }

    /// The single legal successor, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Booting => Some(Self::Management),
            Self::Management => Some(Self::Running),
            Self::Running => None,
        }
    }
}

impl fmt::Display for DeviceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rejected mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: DeviceMode,
    pub to: DeviceMode,
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal mode transition {} -> {}", self.from, self.to)
    }
}

impl std::error::Error for TransitionError {}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Current mode plus the hold-in-management latch.
#[derive(Debug)]
pub struct DeviceState {
    mode: Mutex<DeviceMode>,
    changed: Condvar,
    hold: AtomicBool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceState {
    /// A fresh boot cycle: BOOTING, latch clear.
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(DeviceMode::Booting),
            changed: Condvar::new(),
            hold: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, DeviceMode> {
        self.mode.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> DeviceMode {
        *self.lock()
    }

    /// Move to `next`.  Only the single forward step from the current mode
    /// is accepted; anything else leaves the mode untouched.
    pub fn advance(&self, next: DeviceMode) -> Result<(), TransitionError> {
        let mut mode = self.lock();
        if mode.next() != Some(next) {
            return Err(TransitionError {
                from: *mode,
                to: next,
            });
        }
        info!("Mode: {} -> {}", *mode, next);
        *mode = next;
        drop(mode);
        self.changed.notify_all();
        Ok(())
    }

    /// Set the hold-in-management latch.
    pub fn request_hold(&self) {
        if !self.hold.swap(true, Ordering::AcqRel) {
            info!("Mode: hold-in-management requested");
        }
    }

    /// Clear the latch and wake anything waiting on it.
    pub fn release_hold(&self) {
        if self.hold.swap(false, Ordering::AcqRel) {
            info!("Mode: hold-in-management released");
        }
        // Take the lock so a waiter between its latch check and its wait
        // cannot miss this notification.
        let _guard = self.lock();
        self.changed.notify_all();
    }

    pub fn hold_requested(&self) -> bool {
        self.hold.load(Ordering::Acquire)
    }

    /// Block while the mode is BOOTING, then return the mode reached.
    pub fn wait_until_booted(&self) -> DeviceMode {
        let guard = self
            .changed
            .wait_while(self.lock(), |mode| *mode == DeviceMode::Booting)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Wait up to `timeout` for the latch to clear.  Returns `true` if it
    /// is clear on return.
    pub fn wait_for_hold_release(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        if !self.hold_requested() {
            return true;
        }
        let _ = self
            .changed
            .wait_timeout_while(guard, timeout, |_| self.hold_requested())
            .unwrap_or_else(PoisonError::into_inner);
        !self.hold_requested()
    }
}
