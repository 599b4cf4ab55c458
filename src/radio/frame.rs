//! Outgoing radio frame.
//!
//! Built from a `Send Frame` command and handed to the mesh layer through
//! the frame mailbox.  The header fields are carried verbatim; the payload
//! arrives base64-encoded in `"Data Payload"`.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::app::commands::{JsonObject, int_field, opt_int_field, str_field};
use crate::error::{ProtocolError, Result};

/// Largest payload a single frame can carry, in bytes.
pub const MAX_PAYLOAD: usize = 256;

/// Mesh header as supplied by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameHeader {
    pub pkt_type: u8,
    pub stream_id: u8,
    pub ttl: u8,
    pub sender: u8,
    pub pre_offset: u8,
    pub num_sym_offset: u8,
    pub sym_offset: u8,
}

/// An owned frame ready for the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    /// Host-computed header CRC, if supplied.
    pub header_crc: Option<u16>,
    /// Host-computed payload CRC, if supplied.
    pub data_crc: Option<u16>,
    payload: heapless::Vec<u8, MAX_PAYLOAD>,
}

impl Frame {
    /// Build a frame from raw parts.  Fails if the payload is empty or
    /// exceeds [`MAX_PAYLOAD`].
    pub fn new(header: FrameHeader, payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Err(ProtocolError::invalid("Data Payload", "empty payload"));
        }
        let payload = heapless::Vec::from_slice(payload)
            .map_err(|_| ProtocolError::invalid("Data Payload", "payload exceeds 256 bytes"))?;
        Ok(Self {
            header,
            header_crc: None,
            data_crc: None,
            payload,
        })
    }

    /// Build a frame from the fields of a `Send Frame` command.
    pub fn from_json(obj: &JsonObject) -> Result<Self> {
        let header = FrameHeader {
            pkt_type: int_field(obj, "HDR Pkt Type")?,
            stream_id: int_field(obj, "HDR Stream ID")?,
            ttl: int_field(obj, "HDR TTL")?,
            sender: int_field(obj, "HDR Sender")?,
            pre_offset: opt_int_field(obj, "HDR Pre Offset")?.unwrap_or(0),
            num_sym_offset: opt_int_field(obj, "HDR Num Sym Offset")?.unwrap_or(0),
            sym_offset: opt_int_field(obj, "HDR Sym Offset")?.unwrap_or(0),
        };

        let encoded = str_field(obj, "Data Payload")?;
        let bytes = BASE64
            .decode(encoded)
            .map_err(|_| ProtocolError::invalid("Data Payload", "not valid base64"))?;

        let mut frame = Self::new(header, &bytes)?;
        frame.header_crc = opt_int_field(obj, "Header CRC")?;
        frame.data_crc = opt_int_field(obj, "Data CRC")?;
        Ok(frame)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}
