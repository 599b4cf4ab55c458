//! Transport abstraction: any byte-oriented serial channel.
//!
//! Concrete implementations:
//! - [`StdioTransport`]: the process's stdin/stdout.  On ESP-IDF this is
//!   the console UART; on a host it is whatever the node was piped to.
//! - Test doubles in `tests/integration/`.
//!
//! The I/O loops are generic over `Transport`, so adding a new link
//! requires zero changes to the dispatcher.

use std::io::{self, Read, Write};

/// Byte-oriented transport channel.
pub trait Transport {
    /// Read up to `buf.len()` bytes into `buf`, blocking until at least one
    /// byte is available.  Returns 0 at end of input.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Flush any buffered output.
    fn flush(&mut self) -> io::Result<()>;

    /// Write all of `data`, retrying short writes.
    fn write_all(&mut self, mut data: &[u8]) -> io::Result<()> {
        while !data.is_empty() {
            match self.write(data) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => data = &data[n..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Serial link over standard input and output.
#[derive(Debug, Default)]
pub struct StdioTransport;

impl StdioTransport {
    pub fn new() -> Self {
        Self
    }
}

/// Idle poll for the console UART, which reports "no data" rather than
/// blocking.
#[cfg(target_os = "espidf")]
const CONSOLE_POLL: std::time::Duration = std::time::Duration::from_millis(10);

impl Transport for StdioTransport {
    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::stdin().lock().read(buf)
    }

    /// The console never reaches end of input; wait for at least one byte.
    #[cfg(target_os = "espidf")]
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match io::stdin().lock().read(buf) {
                Ok(0) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                other => return other,
            }
            std::thread::sleep(CONSOLE_POLL);
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        io::stdout().lock().write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().lock().flush()
    }
}
