//! `log` backend that forwards records over the serial link.
//!
//! Every record becomes an outbound `Debug Msg` line whose `Message` is
//! the base64 of `"[LEVEL] target: message\r\n"`.  Records are pushed with
//! a non-blocking enqueue: when the serial mailbox is full the record is
//! dropped and counted, so logging never stalls the caller (including the
//! transmit thread itself).

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::app::events::Response;
use crate::app::ports::TimePort;
use crate::rpc::channels::SerialMailbox;

static DROPPED: AtomicU32 = AtomicU32::new(0);

/// Records lost to a full serial mailbox since boot.
pub fn dropped_count() -> u32 {
    DROPPED.load(Ordering::Relaxed)
}

pub struct SerialLogger<T> {
    serial: Arc<SerialMailbox>,
    clock: T,
    level: LevelFilter,
}

impl<T: TimePort> SerialLogger<T> {
    pub fn new(serial: Arc<SerialMailbox>, clock: T, level: LevelFilter) -> Self {
        Self {
            serial,
            clock,
            level,
        }
    }

    fn render(record: &Record<'_>) -> String {
        format!(
            "[{}] {}: {}\r\n",
            record.level(),
            record.target(),
            record.args()
        )
    }
}

impl<T: TimePort + Send + Sync> Log for SerialLogger<T> {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Never log from inside the logger; an unencodable record is a drop.
        let queued = Response::debug_msg(self.clock.unix_time(), &Self::render(record))
            .to_json()
            .is_ok_and(|line| self.serial.try_enqueue(line).is_ok());
        if !queued {
            DROPPED.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn flush(&self) {}
}

/// Install a [`SerialLogger`] as the global `log` backend.
///
/// The installed logger passes everything; `level` becomes the global
/// `log::max_level`, which may be changed again later with
/// `log::set_max_level` (e.g. once the node config is loaded).
pub fn init<T>(serial: Arc<SerialMailbox>, clock: T, level: LevelFilter) -> Result<(), SetLoggerError>
where
    T: TimePort + Send + Sync + 'static,
{
    log::set_boxed_logger(Box::new(SerialLogger::new(
        serial,
        clock,
        LevelFilter::Trace,
    )))?;
    log::set_max_level(level);
    Ok(())
}
