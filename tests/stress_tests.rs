//! Stress tests for the sink hand-off
//!
//! These tests verify:
//! - Every offered entry is either delivered or counted as dropped
//! - BlockWithTimeout bounds how long callers wait
//! - Ordering per producer survives batching

use index_logger::appenders::MemoryAppender;
use index_logger::writers::{IndexWriter, MemoryIndexWriter};
use index_logger::{infof, BatchIndexer, IndexedEntry, Logger, OverflowPolicy, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const THREADS: usize = 8;
const PER_THREAD: usize = 2_000;

fn logger_for(indexer: &BatchIndexer) -> (Arc<Logger>, MemoryAppender) {
    let console = MemoryAppender::new();
    let logger = Logger::builder("stress", "svc-stress")
        .sink(indexer.handle().expect("indexer running"))
        .console(console.clone())
        .build();
    (Arc::new(logger), console)
}

fn hammer(logger: &Arc<Logger>) {
    let threads: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(logger);
            thread::spawn(move || {
                let quick_id = format!("producer-{}", t);
                for i in 0..PER_THREAD {
                    infof!(logger, &quick_id, "{}", i);
                }
            })
        })
        .collect();
    for t in threads {
        t.join().expect("producer panicked");
    }
}

/// With ample capacity nothing is dropped and per-producer order holds
#[test]
fn test_no_loss_with_ample_capacity() {
    let writer = MemoryIndexWriter::new();
    let mut indexer = BatchIndexer::builder()
        .capacity(THREADS * PER_THREAD)
        .batch_size(256)
        .flush_interval(Duration::from_millis(20))
        .start(writer.clone())
        .expect("indexer starts");

    let (logger, console) = logger_for(&indexer);
    hammer(&logger);
    drop(logger);

    assert!(indexer.shutdown(Duration::from_secs(10)));
    assert_eq!(console.len(), THREADS * PER_THREAD);
    assert_eq!(writer.len(), THREADS * PER_THREAD);

    let mut last_seen: HashMap<String, i64> = HashMap::new();
    for entry in writer.entries() {
        let n: i64 = entry.data.msg.parse().expect("numeric message");
        let last = last_seen.entry(entry.data.quick_id.clone()).or_insert(-1);
        assert!(n > *last, "{} out of order: {} after {}", entry.data.quick_id, n, last);
        *last = n;
    }
}

struct CountingSlowWriter {
    inner: MemoryIndexWriter,
    calls: Arc<AtomicUsize>,
}

impl IndexWriter for CountingSlowWriter {
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        thread::sleep(Duration::from_millis(5));
        self.inner.write_batch(batch)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "counting_slow"
    }
}

/// Under overload every entry is accounted for: delivered or dropped
#[test]
fn test_overload_accounting() {
    let writer = MemoryIndexWriter::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let mut indexer = BatchIndexer::builder()
        .capacity(64)
        .batch_size(16)
        .overflow_policy(OverflowPolicy::DropNewest)
        .start(CountingSlowWriter {
            inner: writer.clone(),
            calls: Arc::clone(&calls),
        })
        .expect("indexer starts");

    let (logger, console) = logger_for(&indexer);
    hammer(&logger);

    let sink_metrics = logger.sink().expect("sink configured").metrics().clone();
    drop(logger);
    assert!(indexer.shutdown(Duration::from_secs(30)));

    let offered = (THREADS * PER_THREAD) as u64;
    assert_eq!(console.len() as u64, offered);
    assert_eq!(sink_metrics.enqueued() + sink_metrics.dropped_count(), offered);
    assert_eq!(writer.len() as u64, sink_metrics.enqueued());
    assert!(calls.load(Ordering::Relaxed) > 0);
}

/// BlockWithTimeout never holds a caller much longer than the timeout
#[test]
fn test_block_with_timeout_bounds_latency() {
    struct Stuck;

    impl IndexWriter for Stuck {
        fn write_batch(&mut self, _batch: &[IndexedEntry]) -> Result<()> {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "stuck"
        }
    }

    let timeout = Duration::from_millis(10);
    let mut indexer = BatchIndexer::builder()
        .capacity(2)
        .batch_size(1)
        .overflow_policy(OverflowPolicy::BlockWithTimeout(timeout))
        .start(Stuck)
        .expect("indexer starts");

    let (logger, _console) = logger_for(&indexer);

    let mut worst = Duration::ZERO;
    for i in 0..20 {
        let start = Instant::now();
        infof!(logger, "q", "entry {}", i);
        worst = worst.max(start.elapsed());
    }

    assert!(worst < Duration::from_millis(250), "worst call took {:?}", worst);
    let metrics = logger.sink().expect("sink configured").metrics();
    assert!(metrics.block_events() > 0);
    assert!(metrics.dropped_count() > 0);

    drop(logger);
    indexer.shutdown(Duration::from_secs(10));
}
