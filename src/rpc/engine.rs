//! Command dispatcher: turns inbound lines into actions and responses.
//!
//! Runs on the serial receive thread and handles one line at a time, so no
//! two commands ever execute concurrently.  Every line ends in one of:
//!
//! 1. **Response(s)**: serialized and pushed onto the serial mailbox in
//!    the order they are produced.
//! 2. **Error response**: the command is refused, nothing else happens,
//!    and the dispatcher keeps serving the link.
//! 3. **Reboot request**: returned as [`Flow::Reboot`]; the receive loop
//!    owns the actual restart.
//!
//! `Erase Log` and `Read Log` touch the filesystem, so they first latch
//! the node into MANAGEMENT and wait for boot to finish.  If the node had
//! already reached RUNNING, the file is left alone.

use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;

use crate::app::commands::Command;
use crate::app::events::Response;
use crate::app::ports::{LogPort, SettingsError, SettingsPort};
use crate::error::{ProtocolError, Result};
use crate::fsm::{DeviceMode, DeviceState};
use crate::settings::{SettingUpdate, SettingsBlock};

use super::channels::{FrameMailbox, SerialMailbox};

/// What the receive loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Responses are queued; restart the node.
    Reboot,
}

/// The serial command dispatcher.
///
/// Sole owner of the live [`SettingsBlock`]; nothing else writes it once
/// the dispatcher exists.
pub struct Dispatcher<S, L> {
    settings: SettingsBlock,
    store: S,
    log: L,
    device: Arc<DeviceState>,
    serial: Arc<SerialMailbox>,
    frames: Arc<FrameMailbox>,
}

impl<S: SettingsPort, L: LogPort> Dispatcher<S, L> {
    pub fn new(
        settings: SettingsBlock,
        store: S,
        log: L,
        device: Arc<DeviceState>,
        serial: Arc<SerialMailbox>,
        frames: Arc<FrameMailbox>,
    ) -> Self {
        Self {
            settings,
            store,
            log,
            device,
            serial,
            frames,
        }
    }

    // ── Entry points ──────────────────────────────────────────

    /// Parse and execute one line.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match Command::parse(line).and_then(|cmd| self.execute(cmd)) {
            Ok(flow) => flow,
            Err(e) => {
                self.reject(&e);
                Flow::Continue
            }
        }
    }

    /// Report a refused command.
    pub fn reject(&self, err: &ProtocolError) {
        warn!("Dispatch: rejected ({})", err);
        self.send(&Response::error(err));
    }

    /// Execute an already-parsed command.
    pub fn execute(&mut self, cmd: Command) -> Result<Flow> {
        debug!("Dispatch: {}", cmd.type_name());
        match cmd {
            Command::GetSettings => {
                self.send_settings();
                Ok(Flow::Continue)
            }
            Command::PutSetting(update) => {
                self.put_setting(update)?;
                self.send_settings();
                Ok(Flow::Continue)
            }
            Command::GetStatus => {
                self.send_status();
                Ok(Flow::Continue)
            }
            Command::SendFrame(frame) => {
                self.frames.enqueue(frame);
                self.send_status();
                Ok(Flow::Continue)
            }
            Command::Reboot => {
                self.send_status();
                info!("Now rebooting...");
                Ok(Flow::Reboot)
            }
            Command::EraseLog => {
                if self.hold_in_management() == DeviceMode::Management {
                    self.erase_log();
                } else {
                    warn!("Erase Log: node already running, log left intact");
                }
                self.send_status();
                Ok(Flow::Reboot)
            }
            Command::ReadLog => {
                if self.hold_in_management() == DeviceMode::Management {
                    self.stream_log();
                } else {
                    warn!("Read Log: node already running, nothing streamed");
                }
                self.send_status();
                Ok(Flow::Reboot)
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// The live settings block.
    pub fn settings(&self) -> &SettingsBlock {
        &self.settings
    }

    /// Current device mode and frame-queue pressure.  Pure read.
    pub fn status(&self) -> Response {
        Response::status(self.device.mode(), self.frames.is_full())
    }

    // ── Internal ──────────────────────────────────────────────

    fn send(&self, response: &Response) {
        match response.to_json() {
            Ok(line) => self.serial.enqueue(line),
            Err(e) => error!("Dropping unencodable response: {}", e),
        }
    }

    fn send_status(&self) {
        self.send(&self.status());
    }

    fn send_settings(&self) {
        self.send(&Response::Settings(self.settings.clone()));
    }

    /// Apply, persist, and only then let the caller acknowledge.  A failed
    /// save leaves the in-memory block as it was.
    fn put_setting(&mut self, update: SettingUpdate) -> Result<()> {
        let previous = self.settings.clone();
        let key = update.key();
        self.settings.apply(update);

        let saved = match self.settings.validate() {
            Err(SettingsError::ValidationFailed(reason)) => {
                Err(ProtocolError::invalid(key.name(), reason))
            }
            _ => self.store.save_settings(&self.settings).map_err(Into::into),
        };
        if let Err(e) = saved {
            self.settings = previous;
            return Err(e);
        }
        info!(
            "Settings: {} = {}",
            key.name(),
            self.settings.get(key)
        );
        Ok(())
    }

    /// Latch MANAGEMENT and wait out BOOTING.  Returns the mode reached.
    fn hold_in_management(&self) -> DeviceMode {
        self.device.request_hold();
        self.device.wait_until_booted()
    }

    fn erase_log(&mut self) {
        match self.log.erase() {
            Ok(()) => info!("Erase Log: log file deleted"),
            Err(e) => self.reject(&ProtocolError::Storage(e.to_string())),
        }
    }

    /// One `Log Entry` per well-formed line, in file order.  Corrupt lines
    /// (bad JSON, bad UTF-8, overlong) are skipped; an I/O error ends the
    /// stream early.
    fn stream_log(&mut self) {
        let lines = match self.log.read_lines() {
            Ok(lines) => lines,
            Err(e) => {
                self.reject(&ProtocolError::Storage(e.to_string()));
                return;
            }
        };

        let (mut sent, mut skipped) = (0usize, 0usize);
        for (idx, line) in lines.enumerate() {
            let line = match line {
                Ok(line) => line,
                Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                    warn!("Read Log: skipping line {}: {}", idx + 1, e);
                    skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!("Read Log: read failed at line {}: {}", idx + 1, e);
                    break;
                }
            };
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match serde_json::from_slice::<Value>(&line) {
                Ok(Value::Object(entry)) => {
                    self.send(&Response::log_entry(entry));
                    sent += 1;
                }
                _ => {
                    warn!("Read Log: skipping corrupt line {}", idx + 1);
                    skipped += 1;
                }
            }
        }
        info!("Read Log: {} entries streamed, {} skipped", sent, skipped);
    }
}
