//! In-memory index writer
//!
//! Records every delivered batch. Clones share the same storage, which
//! makes it possible to hand one clone to an indexer and inspect another.

use super::IndexWriter;
use crate::core::{IndexedEntry, LoggerError, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct MemoryIndexWriter {
    batches: Arc<Mutex<Vec<Vec<IndexedEntry>>>>,
    failures_left: Arc<AtomicUsize>,
    flushes: Arc<AtomicUsize>,
}

impl MemoryIndexWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` calls to `write_batch`
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Delivered batches, in delivery order
    pub fn batches(&self) -> Vec<Vec<IndexedEntry>> {
        self.batches.lock().clone()
    }

    /// Every delivered entry, flattened
    pub fn entries(&self) -> Vec<IndexedEntry> {
        self.batches.lock().iter().flatten().cloned().collect()
    }

    /// Number of delivered entries
    pub fn len(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl IndexWriter for MemoryIndexWriter {
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
        let should_fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(LoggerError::writer("memory writer set to fail"));
        }

        self.batches.lock().push(batch.to_vec());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
