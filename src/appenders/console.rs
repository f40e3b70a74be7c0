//! Console appender implementation

use crate::core::{Appender, Result};
use std::io::{self, Write};

/// Which standard stream a [`ConsoleAppender`] writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes each line to a standard stream under the stream's lock
///
/// The line and its terminator go out in a single `write_all`, so lines
/// from concurrent callers never interleave.
#[derive(Debug, Clone, Default)]
pub struct ConsoleAppender {
    stream: ConsoleStream,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route output to the given stream instead of stdout
    ///
    /// # Example
    ///
    /// ```
    /// use index_logger::appenders::{ConsoleAppender, ConsoleStream};
    ///
    /// let appender = ConsoleAppender::new().with_stream(ConsoleStream::Stderr);
    /// ```
    #[must_use]
    pub fn with_stream(mut self, stream: ConsoleStream) -> Self {
        self.stream = stream;
        self
    }

    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }

    fn terminated(line: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        buf
    }
}

impl Appender for ConsoleAppender {
    fn write_line(&self, line: &str) -> Result<()> {
        let buf = Self::terminated(line);
        match self.stream {
            ConsoleStream::Stdout => io::stdout().lock().write_all(&buf)?,
            ConsoleStream::Stderr => io::stderr().lock().write_all(&buf)?,
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        match self.stream {
            ConsoleStream::Stdout => io::stdout().flush()?,
            ConsoleStream::Stderr => io::stderr().flush()?,
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_newline_terminated() {
        assert_eq!(ConsoleAppender::terminated("{}"), b"{}\n".to_vec());
    }

    #[test]
    fn test_write_to_stdout() {
        let appender = ConsoleAppender::new();
        assert_eq!(appender.stream(), ConsoleStream::Stdout);
        appender.write_line("{\"console\":\"test\"}").unwrap();
        appender.flush().unwrap();
    }
}
