//! Consumer-side counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by the indexer worker
#[derive(Debug)]
pub struct IndexerMetrics {
    /// Batches delivered successfully
    batches_flushed: AtomicU64,

    /// Entries delivered successfully
    entries_indexed: AtomicU64,

    /// Failed delivery attempts, panics included
    write_failures: AtomicU64,

    /// Attempts made after a failure
    retries: AtomicU64,

    /// Batches given up on after the last retry
    failed_batches: AtomicU64,

    /// Entries in batches given up on
    entries_lost: AtomicU64,

    /// Writer panics caught by the worker
    writer_panics: AtomicU64,
}

impl IndexerMetrics {
    pub const fn new() -> Self {
        Self {
            batches_flushed: AtomicU64::new(0),
            entries_indexed: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            failed_batches: AtomicU64::new(0),
            entries_lost: AtomicU64::new(0),
            writer_panics: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_indexed(&self) -> u64 {
        self.entries_indexed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed_batches(&self) -> u64 {
        self.failed_batches.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_lost(&self) -> u64 {
        self.entries_lost.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writer_panics(&self) -> u64 {
        self.writer_panics.load(Ordering::Relaxed)
    }

    pub(crate) fn record_flushed(&self, entries: usize) {
        self.batches_flushed.fetch_add(1, Ordering::Relaxed);
        self.entries_indexed.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_batch(&self, entries: usize) {
        self.failed_batches.fetch_add(1, Ordering::Relaxed);
        self.entries_lost.fetch_add(entries as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_writer_panic(&self) {
        self.writer_panics.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.batches_flushed.store(0, Ordering::Relaxed);
        self.entries_indexed.store(0, Ordering::Relaxed);
        self.write_failures.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.failed_batches.store(0, Ordering::Relaxed);
        self.entries_lost.store(0, Ordering::Relaxed);
        self.writer_panics.store(0, Ordering::Relaxed);
    }
}

impl Default for IndexerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for IndexerMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            batches_flushed: AtomicU64::new(self.batches_flushed()),
            entries_indexed: AtomicU64::new(self.entries_indexed()),
            write_failures: AtomicU64::new(self.write_failures()),
            retries: AtomicU64::new(self.retries()),
            failed_batches: AtomicU64::new(self.failed_batches()),
            entries_lost: AtomicU64::new(self.entries_lost()),
            writer_panics: AtomicU64::new(self.writer_panics()),
        }
    }
}
