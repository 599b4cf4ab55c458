//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter       | Implements          | Connects to                   |
//! |---------------|---------------------|-------------------------------|
//! | `flash`       | StoragePort         | `/fs` partition / memory map  |
//! |               | SettingsPort        |                               |
//! |               | ConfigPort          |                               |
//! | `log_file`    | LogPort             | `logfile.json` on `/fs`       |
//! | `reboot`      | RebootPort          | chip reset / process exit     |
//! | `time`        | TimePort            | system clock                  |
//! | `serial_log`  | `log::Log`          | serial mailbox (Debug Msg)    |
//! | `radio_sink`  | FrameMailbox drain  | placeholder mesh consumer     |

pub mod flash;
pub mod log_file;
pub mod radio_sink;
pub mod reboot;
pub mod serial_log;
pub mod time;
