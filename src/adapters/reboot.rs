//! Node restart adapter.

use log::warn;

use crate::app::ports::RebootPort;

/// Exit status a host supervisor can treat as "restart me".
#[cfg(not(target_os = "espidf"))]
pub const REBOOT_EXIT_CODE: i32 = 3;

/// Restarts the node for real.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemReboot;

impl RebootPort for SystemReboot {
    #[cfg(target_os = "espidf")]
    fn reboot(&self) {
        warn!("Reboot: restarting chip");
        esp_idf_svc::hal::reset::restart();
    }

    /// No chip to reset: exit and let the supervisor start a new process.
    #[cfg(not(target_os = "espidf"))]
    fn reboot(&self) {
        warn!("Reboot: exiting with status {}", REBOOT_EXIT_CODE);
        std::process::exit(REBOOT_EXIT_CODE);
    }
}
