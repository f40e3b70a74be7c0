//! Core logger types and traits

pub mod appender;
pub mod caller;
pub mod error;
pub mod formatter;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod overflow_policy;
pub mod sink;

pub use appender::Appender;
pub use caller::{CallSite, RESOLUTION_FAILED};
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, JsonFormatter};
pub use log_entry::{index_name, IndexedEntry, LogEntry};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, FORMAT_ERROR_MARKER};
pub use metrics::{LoggerMetrics, SinkMetrics};
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use sink::{SinkHandle, DEFAULT_SINK_CAPACITY};
