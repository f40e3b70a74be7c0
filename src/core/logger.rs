//! Main logger implementation

use super::{
    appender::Appender,
    caller::{self, CallSite},
    error::Result,
    formatter::{Formatter, JsonFormatter},
    log_entry::{IndexedEntry, LogEntry},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    sink::SinkHandle,
};
use crate::appenders::ConsoleAppender;
use std::fmt;
use std::sync::Arc;

/// Appended to a message whose arguments failed to format
pub const FORMAT_ERROR_MARKER: &str = "%!(FORMAT ERROR)";

/// Structured JSON logger with an optional indexing sink
///
/// Every call writes one JSON line to the console. `info` and `error`
/// entries are also handed to the sink, partitioned into a daily index
/// `<prefix>_<YYYY-MM-DD>`; `debug` entries never are. Logging calls never
/// fail: formatter, console and sink problems are counted and reported on
/// stderr instead.
///
/// Nothing in a `Logger` changes after construction, so it can be shared
/// behind an `Arc` and called from any number of threads.
///
/// # Example
///
/// ```
/// use index_logger::{infof, Logger};
///
/// let logger = Logger::new("applog", "svc-a", None);
/// logger.infof("req-42", format_args!("user {} logged in", "alice"));
/// infof!(logger, "req-43", "user {} logged out", "alice");
/// ```
pub struct Logger {
    index_prefix: String,
    server_name: String,
    sink: Option<SinkHandle>,
    console: Box<dyn Appender>,
    formatter: Box<dyn Formatter>,
    metrics: Arc<LoggerMetrics>,
}

impl Logger {
    /// Create a logger writing JSON to stdout.
    ///
    /// Passing `None` for `sink` gives console-only behavior.
    #[must_use]
    pub fn new(
        index_prefix: impl Into<String>,
        server_name: impl Into<String>,
        sink: Option<SinkHandle>,
    ) -> Self {
        Self {
            index_prefix: index_prefix.into(),
            server_name: server_name.into(),
            sink,
            console: Box::new(ConsoleAppender::new()),
            formatter: Box::new(JsonFormatter::new()),
            metrics: Arc::new(LoggerMetrics::new()),
        }
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use index_logger::prelude::*;
    /// use index_logger::core::sink;
    ///
    /// let (handle, _receiver) = sink::channel(1024, OverflowPolicy::AlertAndDrop);
    /// let logger = Logger::builder("applog", "svc-a")
    ///     .sink(handle)
    ///     .console(ConsoleAppender::new())
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder(index_prefix: impl Into<String>, server_name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(index_prefix, server_name)
    }

    /// Log a debug entry. Console only, never forwarded to the sink.
    ///
    /// The method forms only know the caller's file and line, so the
    /// function segment of `code_info` is `?`. Use [`debugf!`](crate::debugf),
    /// [`infof!`](crate::infof) or [`errorf!`](crate::errorf) to record the
    /// enclosing function as well.
    #[inline]
    #[track_caller]
    pub fn debugf(&self, quick_id: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Debug, quick_id, args);
    }

    /// Log an info entry. Records `[?]` as the function; see
    /// [`infof!`](crate::infof) for the enclosing function name.
    #[inline]
    #[track_caller]
    pub fn infof(&self, quick_id: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Info, quick_id, args);
    }

    /// Log an error entry. Records `[?]` as the function; see
    /// [`errorf!`](crate::errorf) for the enclosing function name.
    #[inline]
    #[track_caller]
    pub fn errorf(&self, quick_id: &str, args: fmt::Arguments<'_>) {
        self.log(LogLevel::Error, quick_id, args);
    }

    /// Log at `level`, annotated with the caller's file and line.
    #[track_caller]
    pub fn log(&self, level: LogLevel, quick_id: &str, args: fmt::Arguments<'_>) {
        self.log_at(level, Some(CallSite::caller()), quick_id, args);
    }

    /// Log with an explicit call site.
    ///
    /// The logging macros use this to record the enclosing function as
    /// well. `None` produces the resolution-failed marker in `code_info`.
    pub fn log_at(
        &self,
        level: LogLevel,
        call_site: Option<CallSite>,
        quick_id: &str,
        args: fmt::Arguments<'_>,
    ) {
        let entry = LogEntry::new(
            quick_id,
            caller::resolve(call_site.as_ref()),
            level,
            interpolate(args),
            self.server_name.as_str(),
        );
        self.emit(entry);
    }

    fn emit(&self, entry: LogEntry) {
        let line = match self.formatter.render(&entry) {
            Ok(line) => line,
            Err(e) => {
                self.metrics.record_format_failure();
                eprintln!("[LOGGER ERROR] json marshal failed: {}", e);
                return;
            }
        };

        match self.console.write_line(&line) {
            Ok(()) => {
                self.metrics.record_emitted();
            }
            Err(e) => {
                // Report once, count always
                if self.metrics.record_console_failure() == 0 {
                    eprintln!(
                        "[LOGGER ERROR] Console appender '{}' failed: {}",
                        self.console.name(),
                        e
                    );
                }
            }
        }

        if !entry.level.is_indexed() {
            return;
        }
        if let Some(ref sink) = self.sink {
            // Outcome is already tracked in the sink's metrics
            let _ = sink.enqueue(IndexedEntry::partitioned(&self.index_prefix, entry));
        }
    }

    pub fn index_prefix(&self) -> &str {
        &self.index_prefix
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// The sink handle, if this logger forwards to an indexer
    pub fn sink(&self) -> Option<&SinkHandle> {
        self.sink.as_ref()
    }

    /// Console-side metrics
    ///
    /// # Example
    ///
    /// ```
    /// use index_logger::{debugf, Logger};
    /// use index_logger::appenders::MemoryAppender;
    ///
    /// let logger = Logger::builder("applog", "svc-a")
    ///     .console(MemoryAppender::new())
    ///     .build();
    /// debugf!(logger, "q", "warming cache");
    ///
    /// assert_eq!(logger.metrics().emitted(), 1);
    /// ```
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    /// Flush the console appender.
    pub fn flush(&self) -> Result<()> {
        self.console.flush()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("index_prefix", &self.index_prefix)
            .field("server_name", &self.server_name)
            .field("sink", &self.sink)
            .field("console", &self.console.name())
            .field("formatter", &self.formatter.name())
            .finish()
    }
}

/// Render the message body. Never fails; a `Display` impl that errors
/// leaves what it wrote plus [`FORMAT_ERROR_MARKER`].
fn interpolate(args: fmt::Arguments<'_>) -> String {
    if let Some(literal) = args.as_str() {
        return literal.to_string();
    }

    let mut msg = String::new();
    if fmt::write(&mut msg, args).is_err() {
        msg.push_str(FORMAT_ERROR_MARKER);
    }
    msg
}

/// Builder for constructing Logger with a fluent API
pub struct LoggerBuilder {
    index_prefix: String,
    server_name: String,
    sink: Option<SinkHandle>,
    console: Option<Box<dyn Appender>>,
    formatter: Option<Box<dyn Formatter>>,
}

impl LoggerBuilder {
    pub fn new(index_prefix: impl Into<String>, server_name: impl Into<String>) -> Self {
        Self {
            index_prefix: index_prefix.into(),
            server_name: server_name.into(),
            sink: None,
            console: None,
            formatter: None,
        }
    }

    /// Forward `info` and `error` entries to this sink
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, sink: SinkHandle) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Same as [`sink`](Self::sink), accepting an optional handle
    #[must_use = "builder methods return a new value"]
    pub fn maybe_sink(mut self, sink: Option<SinkHandle>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the default stdout appender
    #[must_use = "builder methods return a new value"]
    pub fn console<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.console = Some(Box::new(appender));
        self
    }

    /// Replace the default JSON formatter
    #[must_use = "builder methods return a new value"]
    pub fn formatter<F: Formatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    pub fn build(self) -> Logger {
        let mut logger = Logger::new(self.index_prefix, self.server_name, self.sink);
        if let Some(console) = self.console {
            logger.console = console;
        }
        if let Some(formatter) = self.formatter {
            logger.formatter = formatter;
        }
        logger
    }
}
