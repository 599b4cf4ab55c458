//! Inbound commands from the serial link.
//!
//! One JSON object per line, discriminated by its `"Type"` field.  Parsing
//! happens exactly once, here: every field a handler needs is extracted and
//! type-checked up front, so the [`Dispatcher`](crate::rpc::engine::Dispatcher)
//! only ever sees well-formed [`Command`] values.

use serde_json::Value;

use crate::error::{ProtocolError, Result};
use crate::radio::frame::Frame;
use crate::settings::{ModeString, SettingKey, SettingUpdate};

pub type JsonObject = serde_json::Map<String, Value>;

/// Commands the host can send to the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Return the whole settings block.
    GetSettings,

    /// Change one setting, persist, and return the whole block.
    PutSetting(SettingUpdate),

    /// Return the device mode and frame queue state.
    GetStatus,

    /// Queue a radio frame for transmission.
    SendFrame(Frame),

    /// Report status, then restart.
    Reboot,

    /// Hold in MANAGEMENT, delete the persisted log, report, restart.
    EraseLog,

    /// Hold in MANAGEMENT, stream the persisted log, report, restart.
    ReadLog,
}

impl Command {
    /// Parse one line of input.
    pub fn parse(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;
        let Value::Object(obj) = value else {
            return Err(ProtocolError::Malformed("expected a JSON object".into()));
        };

        match str_field(&obj, "Type")? {
            "Get Settings" => Ok(Self::GetSettings),
            "Put Setting" => parse_put_setting(&obj).map(Self::PutSetting),
            "Get Status" => Ok(Self::GetStatus),
            "Debug Msg" => Err(ProtocolError::UnexpectedDebugMsg),
            "Send Frame" => Frame::from_json(&obj).map(Self::SendFrame),
            "Reboot" => Ok(Self::Reboot),
            "Erase Log" => Ok(Self::EraseLog),
            "Read Log" => Ok(Self::ReadLog),
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }

    /// Wire name of this command's `Type`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::GetSettings => "Get Settings",
            Self::PutSetting(_) => "Put Setting",
            Self::GetStatus => "Get Status",
            Self::SendFrame(_) => "Send Frame",
            Self::Reboot => "Reboot",
            Self::EraseLog => "Erase Log",
            Self::ReadLog => "Read Log",
        }
    }
}

/// The value is read from the field named by `Setting`; `Mode` is the only
/// string-valued key.
fn parse_put_setting(obj: &JsonObject) -> Result<SettingUpdate> {
    let name = str_field(obj, "Setting")?;
    let key =
        SettingKey::from_name(name).ok_or_else(|| ProtocolError::UnknownSetting(name.into()))?;

    match key {
        SettingKey::Frequency => int_field(obj, key.name()).map(SettingUpdate::Frequency),
        SettingKey::SpreadingFactor => {
            int_field(obj, key.name()).map(SettingUpdate::SpreadingFactor)
        }
        SettingKey::Bandwidth => int_field(obj, key.name()).map(SettingUpdate::Bandwidth),
        SettingKey::CodingRate => int_field(obj, key.name()).map(SettingUpdate::CodingRate),
        SettingKey::Mode => {
            let raw = str_field(obj, key.name())?;
            ModeString::try_from(raw)
                .map(SettingUpdate::Mode)
                .map_err(|_| ProtocolError::invalid(key.name(), "longer than 16 bytes"))
        }
    }
}

// ── Field extraction ──────────────────────────────────────────

pub(crate) fn str_field<'a>(obj: &'a JsonObject, name: &'static str) -> Result<&'a str> {
    obj.get(name)
        .ok_or(ProtocolError::MissingField(name))?
        .as_str()
        .ok_or_else(|| ProtocolError::invalid(name, "expected a string"))
}

pub(crate) fn int_field<T: TryFrom<i64>>(obj: &JsonObject, name: &'static str) -> Result<T> {
    let value = obj.get(name).ok_or(ProtocolError::MissingField(name))?;
    to_int(value, name)
}

/// Like [`int_field`] but absent (or `null`) yields `None`.
pub(crate) fn opt_int_field<T: TryFrom<i64>>(
    obj: &JsonObject,
    name: &'static str,
) -> Result<Option<T>> {
    match obj.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => to_int(value, name).map(Some),
    }
}

fn to_int<T: TryFrom<i64>>(value: &Value, name: &'static str) -> Result<T> {
    let raw = value
        .as_i64()
        .ok_or_else(|| ProtocolError::invalid(name, "expected an integer"))?;
    T::try_from(raw).map_err(|_| ProtocolError::invalid(name, "integer out of range"))
}
