//! Serial control plane.
//!
//! Newline-delimited JSON over a byte transport, one command or response
//! object per line.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     Control Plane                          │
//! │                                                            │
//! │  ┌───────────┐   ┌──────────┐   ┌───────────────────────┐  │
//! │  │ Transport │──▶│  Codec   │──▶│  Engine (dispatcher)  │  │
//! │  │ (read)    │   │ (lines)  │   │  → ports, DeviceState │  │
//! │  └───────────┘   └──────────┘   └───────────────────────┘  │
//! │       ▲                                    │               │
//! │       │              ┌─────────────────────┘               │
//! │       │              ▼                                     │
//! │  ┌───────────┐   ┌──────────────┐                          │
//! │  │ Transport │◀──│ SerialMailbox│◀── SerialLogger          │
//! │  │ (write)   │   │  (tx thread) │    (Debug Msg)           │
//! │  └───────────┘   └──────────────┘                          │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod channels;
pub mod codec;
pub mod engine;
pub mod io_task;
pub mod transport;
