//! Indexer worker loop

use super::{config::IndexerConfig, metrics::IndexerMetrics};
use crate::core::{IndexedEntry, LoggerError};
use crate::writers::IndexWriter;
use crossbeam_channel::{select, Receiver};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

/// Buffered entries plus everything needed to deliver them
pub(crate) struct Batcher {
    writer: Box<dyn IndexWriter>,
    config: IndexerConfig,
    metrics: Arc<IndexerMetrics>,
    batch: Vec<IndexedEntry>,
}

impl Batcher {
    pub(crate) fn new(
        writer: Box<dyn IndexWriter>,
        config: IndexerConfig,
        metrics: Arc<IndexerMetrics>,
    ) -> Self {
        let batch = Vec::with_capacity(config.batch_size);
        Self {
            writer,
            config,
            metrics,
            batch,
        }
    }

    /// Buffer an entry, delivering when the batch is full.
    /// Returns true if a delivery happened.
    fn push(&mut self, item: IndexedEntry) -> bool {
        self.batch.push(item);
        if self.batch.len() >= self.config.batch_size {
            self.deliver();
            return true;
        }
        false
    }

    /// Deliver the buffered batch, retrying as configured.
    ///
    /// A batch that fails every attempt is counted and discarded.
    fn deliver(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let size = self.batch.len();
        let attempts = self.config.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            let writer = &mut self.writer;
            let batch = &self.batch;
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                writer.write_batch(batch).and_then(|()| writer.flush())
            }));

            match result {
                Ok(Ok(())) => {
                    self.metrics.record_flushed(size);
                    self.batch.clear();
                    return;
                }
                Ok(Err(e)) => {
                    self.metrics.record_write_failure();
                    last_error = e.to_string();
                }
                Err(panic_info) => {
                    self.metrics.record_write_failure();
                    self.metrics.record_writer_panic();
                    last_error = panic_message(panic_info.as_ref());
                    eprintln!(
                        "[LOGGER CRITICAL] Index writer '{}' panicked: {}.",
                        self.writer.name(),
                        last_error
                    );
                }
            }

            if attempt < attempts {
                self.metrics.record_retry();
                thread::sleep(self.config.retry_backoff);
            }
        }

        let err = LoggerError::batch_failed(size, attempts, last_error);
        eprintln!("[LOGGER ERROR] Index writer '{}': {}", self.writer.name(), err);
        self.metrics.record_failed_batch(size);
        self.batch.clear();
    }

    fn finish(&mut self) {
        self.deliver();
        if let Err(e) = self.writer.flush() {
            eprintln!("[LOGGER ERROR] Index writer '{}' flush failed: {}", self.writer.name(), e);
        }
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Receive, batch and deliver until shut down or every producer is gone.
///
/// A partial batch is delivered once `flush_interval` has passed since its
/// first entry arrived. On shutdown whatever is already queued is drained
/// and the receiver is dropped before the final delivery, so handles that
/// send afterwards see a disconnected channel and count the entry as dropped.
pub(crate) fn run(receiver: Receiver<IndexedEntry>, shutdown: Receiver<()>, mut batcher: Batcher) {
    let interval = batcher.config.flush_interval;
    let mut deadline: Option<Instant> = None;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            batcher.deliver();
            deadline = None;
        }

        let wait = deadline.map_or(interval, |d| d.saturating_duration_since(Instant::now()));

        select! {
            recv(receiver) -> msg => match msg {
                Ok(item) => {
                    if batcher.batch.is_empty() {
                        deadline = Some(Instant::now() + interval);
                    }
                    if batcher.push(item) {
                        deadline = None;
                    }
                }
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
            default(wait) => {
                batcher.deliver();
                deadline = None;
            }
        }
    }

    let pending: Vec<IndexedEntry> = receiver.try_iter().collect();
    drop(receiver);

    for item in pending {
        batcher.push(item);
    }
    batcher.finish();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel, Result};
    use crate::writers::MemoryIndexWriter;
    use std::time::Duration;

    fn item(msg: &str) -> IndexedEntry {
        IndexedEntry::new("applog_2024-03-05", LogEntry::new("q", "", LogLevel::Info, msg, "svc"))
    }

    fn config(batch_size: usize, max_retries: u32) -> IndexerConfig {
        IndexerConfig {
            batch_size,
            max_retries,
            retry_backoff: Duration::from_millis(1),
            ..IndexerConfig::default()
        }
    }

    #[test]
    fn test_push_delivers_full_batches() {
        let writer = MemoryIndexWriter::new();
        let metrics = Arc::new(IndexerMetrics::new());
        let mut batcher = Batcher::new(Box::new(writer.clone()), config(2, 0), Arc::clone(&metrics));

        assert!(!batcher.push(item("a")));
        assert!(batcher.push(item("b")));
        assert!(!batcher.push(item("c")));

        assert_eq!(writer.batches().len(), 1);
        batcher.finish();
        assert_eq!(writer.batches().len(), 2);
        assert_eq!(metrics.entries_indexed(), 3);
        assert_eq!(metrics.batches_flushed(), 2);
    }

    #[test]
    fn test_retry_then_success() {
        let writer = MemoryIndexWriter::new();
        writer.fail_next(2);
        let metrics = Arc::new(IndexerMetrics::new());
        let mut batcher = Batcher::new(Box::new(writer.clone()), config(10, 3), Arc::clone(&metrics));

        batcher.push(item("a"));
        batcher.deliver();

        assert_eq!(writer.len(), 1);
        assert_eq!(metrics.write_failures(), 2);
        assert_eq!(metrics.retries(), 2);
        assert_eq!(metrics.failed_batches(), 0);
    }

    #[test]
    fn test_gives_up_after_retries() {
        let writer = MemoryIndexWriter::new();
        writer.fail_next(10);
        let metrics = Arc::new(IndexerMetrics::new());
        let mut batcher = Batcher::new(Box::new(writer.clone()), config(10, 2), Arc::clone(&metrics));

        batcher.push(item("a"));
        batcher.push(item("b"));
        batcher.deliver();

        assert!(writer.is_empty());
        assert_eq!(metrics.write_failures(), 3);
        assert_eq!(metrics.failed_batches(), 1);
        assert_eq!(metrics.entries_lost(), 2);
        assert!(batcher.batch.is_empty());
    }

    struct PanicOnce {
        panicked: bool,
        inner: MemoryIndexWriter,
    }

    impl IndexWriter for PanicOnce {
        fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
            if !self.panicked {
                self.panicked = true;
                panic!("writer exploded");
            }
            self.inner.write_batch(batch)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panic_once"
        }
    }

    #[test]
    fn test_writer_panic_is_isolated() {
        let inner = MemoryIndexWriter::new();
        let metrics = Arc::new(IndexerMetrics::new());
        let writer = PanicOnce {
            panicked: false,
            inner: inner.clone(),
        };
        let mut batcher = Batcher::new(Box::new(writer), config(10, 1), Arc::clone(&metrics));

        batcher.push(item("survives"));
        batcher.deliver();

        assert_eq!(metrics.writer_panics(), 1);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(boxed.as_ref()), "static str");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(boxed.as_ref()), "Unknown panic");
    }
}
