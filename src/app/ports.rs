//! Port traits: the boundary between the control plane and the node.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Dispatcher / boot sequence
//! ```
//!
//! Everything the control plane touches outside its own memory goes
//! through one of these traits: flash blobs, the persisted log, the reboot
//! line, and the wall clock.  The dispatcher consumes them via generics, so
//! the whole protocol is testable on the host with mock adapters.
//!
//! ## Durability notes
//!
//! - **SettingsPort** implementations MUST validate before persisting and
//!   MUST NOT return `Ok` until the block is on flash.
//! - **StoragePort** writes MUST be atomic: no partial blobs on power loss.

use std::io;

use crate::config::NodeConfig;
use crate::settings::SettingsBlock;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: core ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Persistent namespaced key-value storage.
pub trait StoragePort {
    /// Read a value into a fresh buffer.
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Settings port (driven adapter: core ↔ persisted settings block)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the radio [`SettingsBlock`].
pub trait SettingsPort {
    /// Load the block.  Returns [`SettingsBlock::default()`] on first boot.
    fn load_settings(&self) -> Result<SettingsBlock, SettingsError>;

    /// Validate and persist the block.  Returns only once it is durable.
    fn save_settings(&mut self, settings: &SettingsBlock) -> Result<(), SettingsError>;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: core ↔ node tunables)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`NodeConfig`].
pub trait ConfigPort {
    /// Returns [`NodeConfig::default()`] if no stored config exists.
    fn load_config(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save_config(&mut self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Log port (driven adapter: core ↔ persisted log file)
// ───────────────────────────────────────────────────────────────

/// Raw lines of the persisted log, in file order, without terminators.
///
/// Lines are bytes because flash corruption does not respect UTF-8.  An
/// `Err` of kind [`io::ErrorKind::InvalidData`] marks a single unreadable
/// line and the iterator carries on after it; any other `Err` ends the read.
pub type LogLines = Box<dyn Iterator<Item = io::Result<Vec<u8>>> + Send>;

/// The append-only, line-delimited JSON log.
pub trait LogPort {
    /// Open the log for a full read.  A missing log yields no lines.
    fn read_lines(&self) -> Result<LogLines, LogError>;

    /// Delete the log.  Succeeds if it was already absent.
    fn erase(&mut self) -> Result<(), LogError>;

    /// Append one entry as a single compact JSON line.
    fn append(&mut self, entry: &serde_json::Value) -> Result<(), LogError>;
}

// ───────────────────────────────────────────────────────────────
// Reboot port
// ───────────────────────────────────────────────────────────────

/// Restarts the node.  Real implementations never return; mocks record
/// the request so tests can observe it.
pub trait RebootPort {
    fn reboot(&self);
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source for Debug Msg timestamps.
pub trait TimePort {
    /// Seconds since the Unix epoch (0 if the clock was never set).
    fn unix_time(&self) -> i64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    Io(io::Error),
}

/// Errors from [`SettingsPort`] operations.
#[derive(Debug)]
pub enum SettingsError {
    /// Stored block failed deserialization.
    Corrupted,
    /// A field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Storage(StorageError),
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage failed.
    Storage(StorageError),
}

/// Errors from [`LogPort`] operations.
#[derive(Debug)]
pub enum LogError {
    Io(io::Error),
    Encode(serde_json::Error),
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl core::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "settings corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "settings storage: {}", e),
        }
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Storage(e) => write!(f, "config storage: {}", e),
        }
    }
}

impl core::fmt::Display for LogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "log I/O error: {}", e),
            Self::Encode(e) => write!(f, "log encode error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}
impl std::error::Error for SettingsError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for LogError {}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::StorageFull => Self::Full,
            _ => Self::Io(e),
        }
    }
}

impl From<StorageError> for SettingsError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl From<io::Error> for LogError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}
