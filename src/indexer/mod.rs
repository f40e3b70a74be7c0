//! Batching indexer: the consumer end of the sink queue
//!
//! A [`BatchIndexer`] owns one worker thread that drains the queue,
//! groups entries into batches and hands them to an [`IndexWriter`].
//! Loggers talk to it only through cloned [`SinkHandle`]s.

mod config;
mod metrics;
mod worker;

pub use config::IndexerConfig;
pub use metrics::IndexerMetrics;

use crate::core::{sink, LoggerError, OverflowCallback, OverflowPolicy, Result, SinkHandle};
use crate::writers::IndexWriter;
use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use worker::Batcher;

/// Default shutdown timeout for indexer cleanup (5 seconds)
///
/// Used when the indexer is dropped without explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background batching consumer of the sink queue
///
/// # Example
///
/// ```
/// use index_logger::prelude::*;
/// use index_logger::writers::MemoryIndexWriter;
/// use std::time::Duration;
///
/// let writer = MemoryIndexWriter::new();
/// let mut indexer = BatchIndexer::start(IndexerConfig::default(), writer.clone())?;
///
/// let logger = Logger::new("applog", "svc-a", Some(indexer.handle()?));
/// logger.infof("req-1", format_args!("ready"));
///
/// indexer.shutdown(Duration::from_secs(5));
/// assert_eq!(writer.len(), 1);
/// # Ok::<(), index_logger::LoggerError>(())
/// ```
pub struct BatchIndexer {
    handle: Option<SinkHandle>,
    shutdown_tx: Option<Sender<()>>,
    worker: Option<thread::JoinHandle<()>>,
    metrics: Arc<IndexerMetrics>,
    config: IndexerConfig,
}

impl BatchIndexer {
    /// Validate `config`, create the queue and spawn the worker.
    pub fn start<W: IndexWriter + 'static>(config: IndexerConfig, writer: W) -> Result<Self> {
        Self::spawn(config, Box::new(writer), None)
    }

    #[must_use]
    pub fn builder() -> BatchIndexerBuilder {
        BatchIndexerBuilder::new()
    }

    fn spawn(
        config: IndexerConfig,
        writer: Box<dyn IndexWriter>,
        on_overflow: Option<OverflowCallback>,
    ) -> Result<Self> {
        config.validate()?;

        let (mut handle, receiver) = sink::channel(config.capacity, config.overflow_policy);
        if let Some(callback) = on_overflow {
            handle = handle.with_overflow_callback(callback);
        }
        let (shutdown_tx, shutdown_rx) = bounded::<()>(0);
        let metrics = Arc::new(IndexerMetrics::new());
        let batcher = Batcher::new(writer, config.clone(), Arc::clone(&metrics));

        let worker = thread::Builder::new()
            .name("index-logger-indexer".to_string())
            .spawn(move || worker::run(receiver, shutdown_rx, batcher))
            .map_err(|e| LoggerError::io_operation("spawning indexer thread", "thread spawn failed", e))?;

        Ok(Self {
            handle: Some(handle),
            shutdown_tx: Some(shutdown_tx),
            worker: Some(worker),
            metrics,
            config,
        })
    }

    /// A producer handle for a [`Logger`](crate::Logger).
    ///
    /// Fails once the indexer has been shut down.
    pub fn handle(&self) -> Result<SinkHandle> {
        self.handle.clone().ok_or(LoggerError::IndexerStopped)
    }

    pub fn metrics(&self) -> &IndexerMetrics {
        &self.metrics
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Stop the worker, delivering everything already queued.
    ///
    /// Entries enqueued through outstanding handles after the worker has
    /// drained the queue are dropped and counted by the handles.
    ///
    /// # Returns
    ///
    /// `true` if the worker finished within `timeout`, `false` otherwise.
    /// After `false` the worker keeps delivering; calling `shutdown` again
    /// waits for it once more.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use index_logger::prelude::*;
    /// use index_logger::writers::MemoryIndexWriter;
    /// use std::time::Duration;
    ///
    /// let mut indexer = BatchIndexer::start(IndexerConfig::default(), MemoryIndexWriter::new())?;
    /// if !indexer.shutdown(Duration::from_secs(10)) {
    ///     eprintln!("Warning: indexer shutdown timed out");
    /// }
    /// # Ok::<(), index_logger::LoggerError>(())
    /// ```
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.handle.take());
        // Dropping the sender wakes the worker's shutdown arm
        drop(self.shutdown_tx.take());

        let Some(worker) = self.worker.take() else {
            return true;
        };

        let start = Instant::now();
        loop {
            if worker.is_finished() {
                if let Err(e) = worker.join() {
                    eprintln!("[LOGGER ERROR] Indexer thread panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Indexer thread did not finish within {:?}. \
                     Some entries may not be indexed.",
                    timeout
                );
                self.worker = Some(worker);
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for BatchIndexer {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
        }

        let lost = self.metrics.entries_lost();
        if lost > 0 {
            eprintln!(
                "[LOGGER WARNING] Indexer stopped with {} entries lost in {} failed batches",
                lost,
                self.metrics.failed_batches()
            );
        }
    }
}

/// Builder for [`BatchIndexer`]
///
/// # Example
/// ```
/// use index_logger::prelude::*;
/// use index_logger::writers::MemoryIndexWriter;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let indexer = BatchIndexer::builder()
///     .capacity(4096)
///     .batch_size(200)
///     .flush_interval(Duration::from_millis(500))
///     .overflow_policy(OverflowPolicy::BlockWithTimeout(Duration::from_millis(20)))
///     .on_overflow(Arc::new(|dropped| eprintln!("ALERT: {} entries dropped", dropped)))
///     .start(MemoryIndexWriter::new())?;
/// # Ok::<(), index_logger::LoggerError>(())
/// ```
pub struct BatchIndexerBuilder {
    config: IndexerConfig,
    on_overflow: Option<OverflowCallback>,
}

impl BatchIndexerBuilder {
    pub fn new() -> Self {
        Self {
            config: IndexerConfig::default(),
            on_overflow: None,
        }
    }

    /// Start from a full configuration
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: IndexerConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Set what producers do when the queue is full
    ///
    /// Default is `AlertAndDrop`.
    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.config.overflow_policy = policy;
        self
    }

    /// Set a callback for overflow alerts
    ///
    /// The parameter is the total count of dropped entries.
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn start<W: IndexWriter + 'static>(self, writer: W) -> Result<BatchIndexer> {
        BatchIndexer::spawn(self.config, Box::new(writer), self.on_overflow)
    }
}

impl Default for BatchIndexerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
