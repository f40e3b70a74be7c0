//! Appender trait for console output destinations

use super::error::Result;

/// Destination for rendered log lines.
///
/// Takes `&self` so a logger can be shared across threads without a lock
/// of its own; implementations serialize writes internally so that each
/// line lands whole.
pub trait Appender: Send + Sync {
    /// Write one rendered line, appending the newline terminator.
    fn write_line(&self, line: &str) -> Result<()>;

    fn flush(&self) -> Result<()>;

    fn name(&self) -> &str;
}
