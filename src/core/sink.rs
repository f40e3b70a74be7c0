//! Producer side of the sink queue
//!
//! The queue is a bounded multi-producer, single-consumer channel of
//! [`IndexedEntry`] values. The consumer (normally a
//! [`BatchIndexer`](crate::indexer::BatchIndexer)) owns batching, retry and
//! flushing. Producers only ever wait as long as the configured
//! [`OverflowPolicy`] allows.

use super::{
    error::{LoggerError, Result},
    log_entry::IndexedEntry,
    metrics::SinkMetrics,
    overflow_policy::{OverflowCallback, OverflowPolicy},
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use std::fmt;
use std::sync::Arc;

/// Default number of entries the sink queue can hold
pub const DEFAULT_SINK_CAPACITY: usize = 10_000;

/// Drops between two repeated overflow alerts
const ALERT_EVERY: u64 = 1000;

/// Create a sink queue, returning the producer handle and the consumer end.
///
/// # Example
///
/// ```
/// use index_logger::core::sink;
/// use index_logger::{IndexedEntry, LogEntry, LogLevel, OverflowPolicy};
///
/// let (handle, receiver) = sink::channel(16, OverflowPolicy::DropNewest);
/// let entry = LogEntry::new("req-1", "", LogLevel::Info, "hello", "svc-a");
/// handle.enqueue(IndexedEntry::partitioned("applog", entry)).unwrap();
///
/// assert_eq!(receiver.len(), 1);
/// ```
pub fn channel(capacity: usize, policy: OverflowPolicy) -> (SinkHandle, Receiver<IndexedEntry>) {
    let (sender, receiver) = bounded(capacity);
    (SinkHandle::from_sender(sender, policy), receiver)
}

/// Cloneable producer handle to the sink queue
///
/// All clones share one [`SinkMetrics`] block and overflow callback.
#[derive(Clone)]
pub struct SinkHandle {
    sender: Sender<IndexedEntry>,
    policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    metrics: Arc<SinkMetrics>,
}

impl SinkHandle {
    pub fn from_sender(sender: Sender<IndexedEntry>, policy: OverflowPolicy) -> Self {
        Self {
            sender,
            policy,
            on_overflow: None,
            metrics: Arc::new(SinkMetrics::new()),
        }
    }

    /// Set a callback invoked whenever an overflow alert fires
    #[must_use]
    pub fn with_overflow_callback(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }

    /// Entries currently waiting in the queue
    pub fn len(&self) -> usize {
        self.sender.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sender.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.sender.capacity()
    }

    /// Hand an entry to the indexer.
    ///
    /// Never blocks longer than the policy allows. The returned error only
    /// describes what happened to the entry; the logger ignores it because
    /// the outcome is already counted in [`metrics`](Self::metrics).
    pub fn enqueue(&self, item: IndexedEntry) -> Result<()> {
        match self.sender.try_send(item) {
            Ok(()) => {
                self.metrics.record_enqueued();
                Ok(())
            }
            Err(TrySendError::Full(item)) => self.handle_overflow(item),
            Err(TrySendError::Disconnected(_)) => Err(self.disconnected()),
        }
    }

    fn handle_overflow(&self, item: IndexedEntry) -> Result<()> {
        self.metrics.record_queue_full();

        match self.policy {
            OverflowPolicy::DropNewest => {
                self.metrics.record_dropped();
            }

            OverflowPolicy::AlertAndDrop => {
                self.alert_and_drop("Sink queue full");
            }

            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match self.sender.send_timeout(item, timeout) {
                    Ok(()) => {
                        self.metrics.record_enqueued();
                        return Ok(());
                    }
                    Err(SendTimeoutError::Timeout(_)) => {
                        self.alert_and_drop("Sink queue still full after timeout");
                    }
                    Err(SendTimeoutError::Disconnected(_)) => {
                        return Err(self.disconnected());
                    }
                }
            }
        }

        Err(LoggerError::queue_full(
            self.sender.len(),
            self.sender.capacity().unwrap_or(usize::MAX),
        ))
    }

    fn disconnected(&self) -> LoggerError {
        self.metrics.record_disconnected();
        self.alert_and_drop("Sink channel disconnected");
        LoggerError::SinkDisconnected
    }

    fn alert_and_drop(&self, reason: &str) {
        let dropped_count = self.metrics.record_dropped();

        // First drop and periodically thereafter
        if dropped_count % ALERT_EVERY == 0 {
            eprintln!(
                "[LOGGER WARNING] {}, {} indexed entries dropped. \
                 Consider increasing sink capacity or the indexer batch size.",
                reason,
                dropped_count + 1
            );

            if let Some(ref callback) = self.on_overflow {
                callback(dropped_count + 1);
            }
        }
    }
}

impl fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkHandle")
            .field("policy", &self.policy)
            .field("len", &self.sender.len())
            .field("capacity", &self.sender.capacity())
            .field("has_overflow_callback", &self.on_overflow.is_some())
            .field("metrics", &self.metrics)
            .finish()
    }
}
