//! Line-delimited JSON log file adapter.
//!
//! Implements [`LogPort`] over a single file on the node's filesystem: one
//! compact JSON object per line, appended in event order.
//!
//! Reads hand back raw bytes per line, capped at [`MAX_LINE_LEN`], so a
//! damaged file can neither abort a read nor exhaust the heap.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::app::ports::{LogError, LogLines, LogPort};
use crate::rpc::codec::MAX_LINE_LEN;

pub struct LogFile {
    path: PathBuf,
}

impl LogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogPort for LogFile {
    fn read_lines(&self) -> Result<LogLines, LogError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Box::new(BoundedLines::new(BufReader::new(file)))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("LogFile: {} absent", self.path.display());
                Ok(Box::new(std::iter::empty()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn erase(&mut self) -> Result<(), LogError> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("LogFile: erased {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn append(&mut self, entry: &serde_json::Value) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(&line)?;
        file.flush()?;
        Ok(())
    }
}

/// Splits a reader on `\n`, strips a trailing `\r`, and refuses to buffer
/// more than [`MAX_LINE_LEN`] bytes of any one line.
///
/// An overlong line is consumed up to its newline and reported as
/// [`io::ErrorKind::InvalidData`]; reading resumes with the next line.
struct BoundedLines<R> {
    reader: R,
    eof: bool,
}

impl<R: BufRead> BoundedLines<R> {
    fn new(reader: R) -> Self {
        Self { reader, eof: false }
    }
}

impl<R: BufRead> Iterator for BoundedLines<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            return None;
        }

        let mut line = Vec::new();
        let mut overlong = false;
        let mut started = false;
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            };
            if available.is_empty() {
                self.eof = true;
                break;
            }
            started = true;

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = &available[..newline.unwrap_or(available.len())];
            if !overlong {
                if line.len() + chunk.len() > MAX_LINE_LEN + 1 {
                    overlong = true;
                    line = Vec::new();
                } else {
                    line.extend_from_slice(chunk);
                }
            }
            let used = newline.map_or(available.len(), |i| i + 1);
            self.reader.consume(used);
            if newline.is_some() {
                break;
            }
        }

        if !started {
            return None;
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if overlong || line.len() > MAX_LINE_LEN {
            return Some(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line exceeds {} bytes", MAX_LINE_LEN),
            )));
        }
        Some(Ok(line))
    }
}
