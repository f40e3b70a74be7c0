//! Index writers: destinations for batches drained from the sink queue
//!
//! Writers speak the Elasticsearch `_bulk` NDJSON format: an action line
//! naming the target index, then the document itself, for every entry.

#[cfg(feature = "file")]
pub mod bulk_file;
pub mod memory;
pub mod tcp;

#[cfg(feature = "file")]
pub use bulk_file::BulkFileWriter;
pub use memory::MemoryIndexWriter;
pub use tcp::TcpBulkWriter;

use crate::core::{IndexedEntry, Result};
use serde::Serialize;

/// A batch destination driven by the [`BatchIndexer`](crate::indexer::BatchIndexer)
///
/// Writers are owned by the indexer's worker thread, so `&mut self` is fine.
pub trait IndexWriter: Send {
    /// Deliver one batch. An error makes the indexer retry the whole batch.
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn name(&self) -> &str;
}

impl<W: IndexWriter + ?Sized> IndexWriter for Box<W> {
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
        (**self).write_batch(batch)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[derive(Serialize)]
struct BulkAction<'a> {
    index: BulkTarget<'a>,
}

#[derive(Serialize)]
struct BulkTarget<'a> {
    #[serde(rename = "_index")]
    index: &'a str,
}

/// Append the bulk action and document lines for one entry.
pub fn encode_bulk_entry(item: &IndexedEntry, out: &mut Vec<u8>) -> Result<()> {
    serde_json::to_writer(
        &mut *out,
        &BulkAction {
            index: BulkTarget { index: &item.index },
        },
    )?;
    out.push(b'\n');
    serde_json::to_writer(&mut *out, &item.data)?;
    out.push(b'\n');
    Ok(())
}

/// Encode a whole batch as a `_bulk` request body.
pub fn encode_bulk(batch: &[IndexedEntry]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(batch.len() * 256);
    for item in batch {
        encode_bulk_entry(item, &mut out)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel};

    #[test]
    fn test_bulk_body_shape() {
        let batch = vec![
            IndexedEntry::new("applog_2024-03-05", LogEntry::new("a", "", LogLevel::Info, "one", "svc")),
            IndexedEntry::new("applog_2024-03-06", LogEntry::new("b", "", LogLevel::Error, "two", "svc")),
        ];

        let body = String::from_utf8(encode_bulk(&batch).unwrap()).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));

        assert_eq!(lines[0], r#"{"index":{"_index":"applog_2024-03-05"}}"#);
        assert_eq!(lines[2], r#"{"index":{"_index":"applog_2024-03-06"}}"#);

        let doc: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(doc["msg"], "two");
        assert_eq!(doc["level"], "error");
    }
}
