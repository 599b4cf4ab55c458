//! Stand-in consumer for the outgoing-frame mailbox.
//!
//! The mesh layer that would modulate these frames is not part of this
//! crate.  This thread drains the mailbox so `Send Frame` producers are
//! never parked forever, and logs what it drops.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::debug;

use crate::radio::frame::Frame;
use crate::rpc::channels::FrameMailbox;

const STACK_SIZE: usize = 4 * 1024;

/// Spawn the drain thread.
pub fn spawn(frames: Arc<FrameMailbox>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("radio-sink".into())
        .stack_size(STACK_SIZE)
        .spawn(move || {
            loop {
                let frame = frames.dequeue();
                describe(&frame);
            }
        })
}

fn describe(frame: &Frame) {
    let h = &frame.header;
    debug!(
        "Radio: frame type={} stream={} ttl={} sender={} len={}",
        h.pkt_type,
        h.stream_id,
        h.ttl,
        h.sender,
        frame.payload().len()
    );
}
