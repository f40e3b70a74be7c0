//! # Index Logger
//!
//! A structured JSON logger that writes every entry to standard output and
//! forwards `info` and `error` entries, through a bounded queue, to a
//! batching indexer that partitions them by day.
//!
//! ## Features
//!
//! - **Fire and forget**: logging calls never return errors or wait without bound
//! - **Daily partitions**: entries are indexed as `<prefix>_<YYYY-MM-DD>`
//! - **Batching indexer**: size/interval flushing with retries, bulk NDJSON output
//! - **Thread Safe**: a `Logger` is immutable after construction
//!
//! ## Example
//!
//! ```
//! use index_logger::prelude::*;
//! use index_logger::{errorf, infof};
//! use index_logger::writers::MemoryIndexWriter;
//! use std::time::Duration;
//!
//! let writer = MemoryIndexWriter::new();
//! let mut indexer = BatchIndexer::builder()
//!     .batch_size(100)
//!     .flush_interval(Duration::from_millis(50))
//!     .start(writer.clone())?;
//!
//! let logger = Logger::new("applog", "svc-a", Some(indexer.handle()?));
//! infof!(logger, "req-42", "user {} logged in", "alice");
//! errorf!(logger, "req-42", "payment failed: {}", "card declined");
//!
//! assert!(indexer.shutdown(Duration::from_secs(5)));
//! assert_eq!(writer.len(), 2);
//! # Ok::<(), index_logger::LoggerError>(())
//! ```

pub mod appenders;
pub mod core;
pub mod indexer;
pub mod macros;
pub mod writers;

pub mod prelude {
    pub use crate::appenders::{ConsoleAppender, MemoryAppender};
    pub use crate::core::{
        Appender, CallSite, Formatter, IndexedEntry, JsonFormatter, LogEntry, LogLevel, Logger,
        LoggerBuilder, LoggerError, LoggerMetrics, OverflowCallback, OverflowPolicy, Result,
        SinkHandle, SinkMetrics,
    };
    pub use crate::indexer::{BatchIndexer, IndexerConfig, IndexerMetrics, DEFAULT_SHUTDOWN_TIMEOUT};
    pub use crate::writers::IndexWriter;
}

pub use appenders::{ConsoleAppender, MemoryAppender};
pub use core::{
    Appender, CallSite, Formatter, IndexedEntry, JsonFormatter, LogEntry, LogLevel, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, OverflowCallback, OverflowPolicy, Result,
    SinkHandle, SinkMetrics,
};
pub use indexer::{BatchIndexer, IndexerConfig, IndexerMetrics, DEFAULT_SHUTDOWN_TIMEOUT};
pub use writers::IndexWriter;
