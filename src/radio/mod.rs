//! Radio-side types shared with the mesh layer.
//!
//! The control plane only builds frames and queues them.  Everything that
//! happens to a frame after the frame mailbox belongs to the mesh thread.

pub mod frame;
