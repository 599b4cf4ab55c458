//! Protocol-level error types for the serial control plane.
//!
//! Every command that cannot be acted upon funnels into [`ProtocolError`].
//! The dispatcher turns it into exactly one outbound `Error` response and
//! keeps serving the link, so a single bad line never costs a reboot.

use core::fmt;

// ---------------------------------------------------------------------------
// Wire-facing error kinds
// ---------------------------------------------------------------------------

/// Discriminator written into the `Error` field of an Error response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line was not a JSON object (or not UTF-8, or too long).
    MalformedInput,
    /// A field required by the command type is absent.
    MissingField,
    /// A field is present but has the wrong type or an out-of-range value.
    InvalidField,
    /// `Type` names no known command.
    UnknownCommandType,
    /// `Put Setting` named a key the settings block does not carry.
    UnknownSetting,
    /// A recognised message that is never legal inbound (e.g. `Debug Msg`).
    ProtocolViolation,
    /// Persistent storage rejected the operation.
    StorageFailure,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "MalformedInput",
            Self::MissingField => "MissingField",
            Self::InvalidField => "InvalidField",
            Self::UnknownCommandType => "UnknownCommandType",
            Self::UnknownSetting => "UnknownSetting",
            Self::ProtocolViolation => "ProtocolViolation",
            Self::StorageFailure => "StorageFailure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Protocol error
// ---------------------------------------------------------------------------

/// A command the dispatcher refused to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Unparseable line. Carries the parser's description.
    Malformed(String),
    /// Required field absent.
    MissingField(&'static str),
    /// Field present but unusable.
    InvalidField {
        field: String,
        reason: &'static str,
    },
    /// Unrecognised `Type` value.
    UnknownType(String),
    /// `Put Setting` for a key outside the settings block.
    UnknownSetting(String),
    /// Inbound `Debug Msg`.
    UnexpectedDebugMsg,
    /// Settings could not be validated or persisted.
    Storage(String),
}

impl ProtocolError {
    pub fn invalid(field: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed(_) => ErrorKind::MalformedInput,
            Self::MissingField(_) => ErrorKind::MissingField,
            Self::InvalidField { .. } => ErrorKind::InvalidField,
            Self::UnknownType(_) => ErrorKind::UnknownCommandType,
            Self::UnknownSetting(_) => ErrorKind::UnknownSetting,
            Self::UnexpectedDebugMsg => ErrorKind::ProtocolViolation,
            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(msg) => write!(f, "malformed input: {msg}"),
            Self::MissingField(name) => write!(f, "missing field \"{name}\""),
            Self::InvalidField { field, reason } => {
                write!(f, "invalid field \"{field}\": {reason}")
            }
            Self::UnknownType(t) => write!(f, "unknown command type \"{t}\""),
            Self::UnknownSetting(s) => write!(f, "unknown setting \"{s}\""),
            Self::UnexpectedDebugMsg => write!(f, "Debug Msg is outbound only"),
            Self::Storage(msg) => write!(f, "storage: {msg}"),
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}

impl From<crate::app::ports::SettingsError> for ProtocolError {
    fn from(e: crate::app::ports::SettingsError) -> Self {
        match e {
            crate::app::ports::SettingsError::ValidationFailed(reason) => {
                Self::invalid("Setting", reason)
            }
            other => Self::Storage(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Result alias for command parsing and execution.
pub type Result<T> = core::result::Result<T, ProtocolError>;
