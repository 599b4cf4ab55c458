//! Mesh node control plane.
//!
//! Exposes the protocol, state machine and adapters for integration
//! testing.  ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod radio;
pub mod rpc;
pub mod settings;
