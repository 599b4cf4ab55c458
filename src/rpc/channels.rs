//! Bounded mailboxes between the control plane's threads.
//!
//! Wraps `embassy-sync` bounded channels so plain OS threads can block on
//! them: a full mailbox parks the producer, an empty one parks the
//! consumer, and nothing is ever dropped by `enqueue`.
//!
//! ```text
//! ┌──────────────┐   String   ┌──────────────┐
//! │  Dispatcher  │───────────▶│  Serial Tx   │
//! │  (rx thread) │            │  thread      │
//! │              │   Frame    ┌──────────────┐
//! │              │───────────▶│  Mesh layer  │
//! └──────────────┘            └──────────────┘
//! ```
//!
//! Messages move in by value and move out by value; no shared handles.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use futures_lite::future::block_on;

use crate::radio::frame::Frame;

/// Mailbox depth for serialized response lines.
pub const SERIAL_DEPTH: usize = 16;

/// Mailbox depth for outgoing radio frames.
pub const FRAME_DEPTH: usize = 16;

/// Fixed-capacity multi-producer / single-consumer queue of owned messages.
///
/// Each producer's messages are dequeued in the order it enqueued them.
/// When several producers are blocked on a full mailbox, which one gets
/// the next free slot is unspecified.
pub struct Mailbox<T, const N: usize> {
    channel: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> Default for Mailbox<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Mailbox<T, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Append `msg`, blocking the calling thread while the mailbox is full.
    pub fn enqueue(&self, msg: T) {
        block_on(self.channel.send(msg));
    }

    /// Append `msg` without blocking.  Hands it back if the mailbox is full.
    pub fn try_enqueue(&self, msg: T) -> Result<(), T> {
        self.channel.try_send(msg).map_err(|e| match e {
            TrySendError::Full(msg) => msg,
        })
    }

    /// Remove the oldest message, blocking while the mailbox is empty.
    pub fn dequeue(&self) -> T {
        block_on(self.channel.receive())
    }

    /// Remove the oldest message if there is one.
    pub fn try_dequeue(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Advisory only: another thread may change the answer immediately.
    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    /// Advisory only, like [`is_full`](Self::is_full).
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Serialized response lines waiting for the serial transmitter.
pub type SerialMailbox = Mailbox<String, SERIAL_DEPTH>;

/// Frames waiting for the mesh layer.
pub type FrameMailbox = Mailbox<Frame, FRAME_DEPTH>;
