//! Indexed logging example
//!
//! Demonstrates handing `info` and `error` entries to a batching indexer
//! that writes daily `_bulk` NDJSON partition files.
//!
//! Run with: cargo run --example indexed_logging

use index_logger::prelude::*;
use index_logger::writers::BulkFileWriter;
use index_logger::{debugf, errorf, infof};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    eprintln!("=== index_logger - Indexed Logging Example ===\n");

    let dir = std::env::temp_dir().join("index_logger_demo");
    let writer = BulkFileWriter::new(&dir)?.with_compression(true);

    let mut indexer = BatchIndexer::builder()
        .capacity(4096)
        .batch_size(100)
        .flush_interval(Duration::from_millis(200))
        .overflow_policy(OverflowPolicy::AlertAndDrop)
        .on_overflow(Arc::new(|dropped| eprintln!("ALERT: {} entries dropped", dropped)))
        .start(writer)?;

    let logger = Arc::new(Logger::new("applog", "svc-a", Some(indexer.handle()?)));

    eprintln!("1. Logging from several threads:");
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                let quick_id = format!("worker-{}", t);
                for i in 0..25 {
                    debugf!(logger, &quick_id, "step {} (console only)", i);
                    infof!(logger, &quick_id, "step {} done", i);
                }
                errorf!(logger, &quick_id, "worker {} finished with a warning", t);
            })
        })
        .collect();
    for w in workers {
        w.join().ok();
    }

    let sink_metrics = logger.sink().map(|s| s.metrics().clone());
    drop(logger);

    eprintln!("\n2. Shutting down the indexer:");
    if !indexer.shutdown(Duration::from_secs(5)) {
        eprintln!("Warning: indexer shutdown timed out");
    }

    let metrics = indexer.metrics();
    eprintln!("   Entries indexed: {}", metrics.entries_indexed());
    eprintln!("   Batches flushed: {}", metrics.batches_flushed());
    eprintln!("   Entries lost:    {}", metrics.entries_lost());
    if let Some(sink) = sink_metrics {
        eprintln!("   Entries dropped: {}", sink.dropped_count());
    }
    eprintln!("   Partitions in:   {}", dir.display());

    eprintln!("\n=== Example completed successfully! ===");
    Ok(())
}
