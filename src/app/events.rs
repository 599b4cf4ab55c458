//! Outbound responses.
//!
//! Every line the node writes to the serial link is one of these, rendered
//! as a single JSON object with a `"Type"` discriminator.  Responses are
//! serialized to text before they enter the serial mailbox; the transmit
//! thread never looks inside them.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Serialize, Serializer};

use crate::app::commands::JsonObject;
use crate::error::ProtocolError;
use crate::fsm::DeviceMode;
use crate::settings::SettingsBlock;

/// Structured responses emitted by the dispatcher and the logger.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type")]
pub enum Response {
    /// Mirror of the whole settings block.
    #[serde(rename = "Settings")]
    Settings(SettingsBlock),

    /// Device mode and frame queue state.
    #[serde(rename = "Status")]
    Status {
        #[serde(rename = "Status")]
        mode: DeviceMode,
        #[serde(rename = "Tx Frame Queue Full", serialize_with = "true_false")]
        tx_frame_queue_full: bool,
    },

    /// One line of the persisted log.  The stored fields are carried as-is;
    /// any stored `Type` is replaced by `"Log Entry"`.
    #[serde(rename = "Log Entry")]
    LogEntry(JsonObject),

    /// Diagnostic text from the node's logger.
    #[serde(rename = "Debug Msg")]
    DebugMsg {
        #[serde(rename = "Timestamp")]
        timestamp: i64,
        /// Base64 of the raw message text.
        #[serde(rename = "Message")]
        message: String,
    },

    /// A command was refused.
    #[serde(rename = "Error")]
    Error {
        #[serde(rename = "Error")]
        kind: &'static str,
        #[serde(rename = "Message")]
        message: String,
    },
}

impl Response {
    pub fn status(mode: DeviceMode, tx_frame_queue_full: bool) -> Self {
        Self::Status {
            mode,
            tx_frame_queue_full,
        }
    }

    /// Re-tag a persisted log object as a `Log Entry`.
    pub fn log_entry(mut entry: JsonObject) -> Self {
        entry.remove("Type");
        Self::LogEntry(entry)
    }

    /// Encode raw diagnostic text.
    pub fn debug_msg(timestamp: i64, text: &str) -> Self {
        Self::DebugMsg {
            timestamp,
            message: BASE64.encode(text.as_bytes()),
        }
    }

    pub fn error(err: &ProtocolError) -> Self {
        Self::Error {
            kind: err.kind().as_str(),
            message: err.to_string(),
        }
    }

    /// Render as one line of JSON (no terminator).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn true_false<S: Serializer>(flag: &bool, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(if *flag { "True" } else { "False" })
}
