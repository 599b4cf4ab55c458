//! Serial I/O threads: the bridge between a [`Transport`] and the mailboxes.
//!
//! ```text
//!  ┌──────────────────────────┐         ┌──────────────────────────┐
//!  │  serial-rx thread        │         │  serial-tx thread        │
//!  │                          │         │                          │
//!  │  Transport::read         │         │  SerialMailbox::dequeue  │
//!  │     │                    │         │     │                    │
//!  │     ▼                    │ String  │     ▼                    │
//!  │  LineDecoder ─▶ Dispatcher ───────▶│  encode_line ─▶ write    │
//!  │                          │         │                          │
//!  └──────────────────────────┘         └──────────────────────────┘
//! ```
//!
//! The transmit thread is the only writer on the link, so lines from the
//! dispatcher and from the logger never interleave mid-line.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{info, warn};

use super::channels::SerialMailbox;
use super::codec::{LineDecoder, encode_line};
use super::engine::{Dispatcher, Flow};
use super::transport::Transport;
use crate::app::ports::{LogPort, RebootPort, SettingsPort};
use crate::error::ProtocolError;

const READ_BUF_SIZE: usize = 256;

/// Stack for the transmit thread.
pub const TX_STACK_SIZE: usize = 8 * 1024;

/// Stack for the receive thread.  Parsing and settings persistence run here.
pub const RX_STACK_SIZE: usize = 16 * 1024;

/// Upper bound on waiting for queued responses before a reboot.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

const DRAIN_POLL: Duration = Duration::from_millis(10);

/// Why the receive loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxExit {
    /// The transport reported end of input.
    InputClosed,
    /// A reboot was requested and the reboot port returned.
    Rebooted,
}

// ── Transmit ─────────────────────────────────────────────────

/// Spawn the transmit thread.  It owns `transport` and writes every line
/// dequeued from `serial`, terminated by `\r\n`, for the life of the node.
pub fn spawn_tx<T>(serial: Arc<SerialMailbox>, transport: T) -> io::Result<JoinHandle<()>>
where
    T: Transport + Send + 'static,
{
    thread::Builder::new()
        .name("serial-tx".into())
        .stack_size(TX_STACK_SIZE)
        .spawn(move || run_tx(&serial, transport))
}

fn run_tx<T: Transport>(serial: &SerialMailbox, mut transport: T) {
    let mut out = Vec::with_capacity(READ_BUF_SIZE);
    // Only the first failure of a streak is logged: the log line itself
    // would be queued for this same link.
    let mut failing = false;

    loop {
        let line = serial.dequeue();
        out.clear();
        encode_line(&line, &mut out);

        match transport.write_all(&out).and_then(|()| transport.flush()) {
            Ok(()) => failing = false,
            Err(e) => {
                if !failing {
                    warn!("Serial: write failed: {}", e);
                }
                failing = true;
            }
        }
    }
}

/// Block until the transmit thread has taken every queued line, or until
/// `timeout` passes.  Returns `true` if the mailbox drained.
pub fn wait_drained(serial: &SerialMailbox, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !serial.is_empty() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(DRAIN_POLL);
    }
    true
}

// ── Receive ──────────────────────────────────────────────────

/// Run the receive loop on the calling thread.
///
/// Feeds every byte from `transport` through the line decoder and hands
/// complete lines to `dispatcher`.  On a reboot request the queued
/// responses are flushed, `grace` is allowed for the transmitter to finish
/// the last line, and `reboot` is invoked.
pub fn run_rx<T, S, L, R>(
    mut transport: T,
    dispatcher: &mut Dispatcher<S, L>,
    reboot: &R,
    serial: &SerialMailbox,
    grace: Duration,
) -> io::Result<RxExit>
where
    T: Transport,
    S: SettingsPort,
    L: LogPort,
    R: RebootPort + ?Sized,
{
    let mut decoder = LineDecoder::new();
    let mut buf = [0u8; READ_BUF_SIZE];
    info!("Serial: receive loop started");

    loop {
        let n = match transport.read(&mut buf) {
            Ok(0) => {
                info!("Serial: input closed");
                return Ok(RxExit::InputClosed);
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        for &byte in &buf[..n] {
            let flow = match decoder.push(byte) {
                None => continue,
                Some(Ok(line)) => dispatcher.handle_line(&line),
                Some(Err(e)) => {
                    dispatcher.reject(&ProtocolError::Malformed(e.to_string()));
                    Flow::Continue
                }
            };

            if flow == Flow::Reboot {
                if !wait_drained(serial, DRAIN_TIMEOUT) {
                    warn!("Serial: rebooting with {} lines unsent", serial.len());
                }
                thread::sleep(grace);
                reboot.reboot();
                return Ok(RxExit::Rebooted);
            }
        }
    }
}
