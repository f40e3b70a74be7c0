//! Rendering of log entries into console lines

use super::{
    error::{LoggerError, Result},
    log_entry::LogEntry,
};

/// Turns an entry into a single output line (without the trailing newline).
pub trait Formatter: Send + Sync {
    fn render(&self, entry: &LogEntry) -> Result<String>;

    fn name(&self) -> &str;
}

/// Canonical single-line JSON rendering
///
/// # Example
///
/// ```
/// use index_logger::core::{Formatter, JsonFormatter, LogEntry, LogLevel};
///
/// let entry = LogEntry::new("req-1", "[main] [main.rs.3] ", LogLevel::Info, "ready", "svc-a");
/// let line = JsonFormatter::new().render(&entry).unwrap();
/// assert!(line.starts_with("{\"quick_id\":\"req-1\""));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }
}

impl Formatter for JsonFormatter {
    fn render(&self, entry: &LogEntry) -> Result<String> {
        serde_json::to_string(entry).map_err(|e| LoggerError::formatter(self.name(), e.to_string()))
    }

    fn name(&self) -> &str {
        "json"
    }
}
