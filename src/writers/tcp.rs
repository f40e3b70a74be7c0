//! TCP bulk writer
//!
//! Streams `_bulk` NDJSON bodies to a remote collector over TCP, such as a
//! log shipper listening for newline-delimited JSON.

use super::{encode_bulk, IndexWriter};
use crate::core::{IndexedEntry, LoggerError, Result};
use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends each batch as one NDJSON payload over a TCP connection
///
/// # Example
///
/// ```no_run
/// use index_logger::writers::TcpBulkWriter;
///
/// let writer = TcpBulkWriter::connect("127.0.0.1:5170")
///     .expect("Failed to connect to collector");
/// ```
pub struct TcpBulkWriter {
    stream: Option<TcpStream>,
    address: String,
    reconnect_on_error: bool,
}

impl TcpBulkWriter {
    /// Connect to a collector.
    ///
    /// # Errors
    ///
    /// Returns error if connection fails
    pub fn connect(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let address = addr.to_string();
        let stream = Self::open(&address)?;

        Ok(Self {
            stream: Some(stream),
            address,
            reconnect_on_error: true,
        })
    }

    /// Enable or disable one reconnect-and-resend attempt on write errors
    ///
    /// Default: enabled
    #[must_use]
    pub fn with_reconnect(mut self, enable: bool) -> Self {
        self.reconnect_on_error = enable;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn open(address: &str) -> Result<TcpStream> {
        let stream = TcpStream::connect(address).map_err(|e| {
            LoggerError::io_operation("connecting to collector", address.to_string(), e)
        })?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn send(&mut self, payload: &[u8]) -> (usize, io::Result<()>) {
        match self.stream {
            Some(ref mut stream) => write_tracked(stream, payload),
            None => (
                0,
                Err(io::Error::new(
                    io::ErrorKind::NotConnected,
                    "collector stream not connected",
                )),
            ),
        }
    }
}

/// Like `write_all`, but also reports how many bytes went out before a failure.
fn write_tracked<W: Write>(writer: &mut W, mut buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while !buf.is_empty() {
        match writer.write(buf) {
            Ok(0) => {
                return (
                    written,
                    Err(io::Error::new(io::ErrorKind::WriteZero, "failed to write whole payload")),
                );
            }
            Ok(n) => {
                written += n;
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, Ok(()))
}

impl IndexWriter for TcpBulkWriter {
    /// Send the batch as one payload.
    ///
    /// The payload is resent on a fresh connection only when none of it
    /// reached the old one. After a partial write the connection is dropped
    /// and the error returned; the collector sees a truncated last line on
    /// the closed connection, and a retry starts over on a new one.
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
        let payload = encode_bulk(batch)?;

        let (written, result) = self.send(&payload);
        let Err(e) = result else {
            return Ok(());
        };
        self.stream = None;

        if written > 0 {
            return Err(LoggerError::writer(format!(
                "Connection failed after {} of {} bytes: {}",
                written,
                payload.len(),
                e
            )));
        }

        if !self.reconnect_on_error {
            return Err(e.into());
        }

        match Self::open(&self.address) {
            Ok(stream) => {
                self.stream = Some(stream);
                let (_, resent) = self.send(&payload);
                if resent.is_err() {
                    self.stream = None;
                }
                resent?;
                Ok(())
            }
            Err(reconnect_err) => Err(LoggerError::writer(format!(
                "Failed to send batch and reconnect: {} (reconnect: {})",
                e, reconnect_err
            ))),
        }
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut stream) = self.stream {
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tcp"
    }
}

impl Drop for TcpBulkWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
