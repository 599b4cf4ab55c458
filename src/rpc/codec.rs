//! Newline-delimited line codec.
//!
//! Wire format, both directions:
//! ```text
//! ┌──────────────────────────┬──────┐
//! │ JSON object (UTF-8)      │ \r\n │
//! └──────────────────────────┴──────┘
//! ```
//!
//! The decoder accumulates incoming bytes and yields complete lines, so a
//! single `Transport::read` may deliver part of a line or several lines.
//! Inbound `\n` alone also terminates a line; a trailing `\r` is stripped.

/// Maximum inbound line length (protects against memory exhaustion).
pub const MAX_LINE_LEN: usize = 2048;

/// Outbound line terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// A line the decoder could not deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineError {
    /// Longer than [`MAX_LINE_LEN`]; discarded up to its newline.
    TooLong,
    /// Not valid UTF-8.
    NotUtf8,
}

impl core::fmt::Display for LineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TooLong => write!(f, "line exceeds {} bytes", MAX_LINE_LEN),
            Self::NotUtf8 => write!(f, "line is not valid UTF-8"),
        }
    }
}

/// Streaming line decoder.
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    /// Set once the current line overflowed; cleared at its newline.
    discarding: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            discarding: false,
        }
    }

    /// Feed one byte.  Returns a result when a non-empty line completes.
    pub fn push(&mut self, byte: u8) -> Option<Result<String, LineError>> {
        if byte != b'\n' {
            if !self.discarding && self.buf.push(byte).is_err() {
                self.discarding = true;
                self.buf.clear();
            }
            return None;
        }

        if self.discarding {
            self.discarding = false;
            return Some(Err(LineError::TooLong));
        }

        let mut line = &self.buf[..];
        if let Some(stripped) = line.strip_suffix(b"\r") {
            line = stripped;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            self.buf.clear();
            return None;
        }

        let out = core::str::from_utf8(line)
            .map(str::to_owned)
            .map_err(|_| LineError::NotUtf8);
        self.buf.clear();
        Some(out)
    }

    /// Drop any partial line (e.g. after the link is reopened).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
    }
}

/// Encode one outbound line: `payload` followed by `\r\n`.
pub fn encode_line(payload: &str, out: &mut Vec<u8>) {
    out.reserve(payload.len() + LINE_TERMINATOR.len());
    out.extend_from_slice(payload.as_bytes());
    out.extend_from_slice(LINE_TERMINATOR);
}
