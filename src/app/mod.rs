//! Application core: the serial protocol's vocabulary, with zero I/O.
//!
//! Inbound lines parse into [`commands::Command`], outbound objects are
//! [`events::Response`], and everything the dispatcher needs from the
//! outside world sits behind the **port traits** in [`ports`].

pub mod commands;
pub mod events;
pub mod ports;
