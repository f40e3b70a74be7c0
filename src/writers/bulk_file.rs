//! Daily partition files in `_bulk` NDJSON format
//!
//! Each index name `<prefix>_<YYYY-MM-DD>` maps to `<dir>/<index>.ndjson`.
//! One partition per prefix is kept open and exclusively locked; when an
//! entry for a newer day of the same prefix arrives, the old partition is
//! closed and optionally gzipped.

use super::{encode_bulk_entry, IndexWriter};
use crate::core::{IndexedEntry, LoggerError, Result};
use flate2::{write::GzEncoder, Compression};
use fs2::FileExt;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const PARTITION_EXTENSION: &str = "ndjson";
const COPY_BUFFER: usize = 64 * 1024;

struct Partition {
    index: String,
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Partition {
    fn release(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        FileExt::unlock(self.writer.get_ref())?;
        Ok(self.path)
    }
}

enum Placement {
    Current,
    Late,
    Roll,
    Open,
}

/// Writes batches into per-day partition files
///
/// # Example
///
/// ```no_run
/// use index_logger::writers::BulkFileWriter;
///
/// let writer = BulkFileWriter::new("/var/log/svc-a/index")
///     .unwrap()
///     .with_compression(true);
/// ```
pub struct BulkFileWriter {
    dir: PathBuf,
    compress_closed: bool,
    open: HashMap<String, Partition>,
}

impl BulkFileWriter {
    /// Create a writer rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::io_operation(
                "creating partition directory",
                dir.display().to_string(),
                e,
            )
        })?;

        Ok(Self {
            dir,
            compress_closed: false,
            open: HashMap::new(),
        })
    }

    /// Gzip partitions once a newer day replaces them
    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress_closed = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn partition_path(&self, index: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", index, PARTITION_EXTENSION))
    }

    /// Index names of the partitions currently held open, sorted
    pub fn open_partitions(&self) -> Vec<String> {
        let mut indexes: Vec<String> = self.open.values().map(|p| p.index.clone()).collect();
        indexes.sort();
        indexes
    }

    /// Flush and unlock every open partition without compressing it.
    pub fn close_all(&mut self) -> Result<()> {
        for (_, partition) in self.open.drain() {
            partition.release()?;
        }
        Ok(())
    }

    fn open_partition(&self, index: &str) -> Result<Partition> {
        let path = self.partition_path(index);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                LoggerError::io_operation("opening partition", path.display().to_string(), e)
            })?;

        FileExt::try_lock_exclusive(&file)
            .map_err(|_| LoggerError::partition_lock(path.display().to_string()))?;

        Ok(Partition {
            index: index.to_string(),
            path,
            writer: BufWriter::new(file),
        })
    }

    fn close_partition(&self, partition: Partition) -> Result<()> {
        let path = partition.release()?;
        if self.compress_closed {
            compress_file(&path)?;
        }
        Ok(())
    }

    fn placement(&self, key: &str, index: &str) -> Placement {
        match self.open.get(key) {
            Some(p) if p.index == index => Placement::Current,
            Some(p) if index < p.index.as_str() => Placement::Late,
            Some(_) => Placement::Roll,
            None => Placement::Open,
        }
    }

    fn write_entry(&mut self, index: &str, bytes: &[u8]) -> Result<()> {
        let key = partition_key(index).to_string();

        match self.placement(&key, index) {
            Placement::Current => {}
            Placement::Late => {
                // An entry stamped before the current partition's day
                let mut partition = self.open_partition(index)?;
                partition.writer.write_all(bytes)?;
                return self.close_partition(partition);
            }
            Placement::Roll => {
                if let Some(old) = self.open.remove(&key) {
                    self.close_partition(old)?;
                }
                let partition = self.open_partition(index)?;
                self.open.insert(key.clone(), partition);
            }
            Placement::Open => {
                let partition = self.open_partition(index)?;
                self.open.insert(key.clone(), partition);
            }
        }

        let partition = self
            .open
            .get_mut(&key)
            .ok_or_else(|| LoggerError::partition(index, "partition not open"))?;
        partition.writer.write_all(bytes)?;
        Ok(())
    }
}

impl IndexWriter for BulkFileWriter {
    fn write_batch(&mut self, batch: &[IndexedEntry]) -> Result<()> {
        let mut buf = Vec::with_capacity(512);
        for item in batch {
            buf.clear();
            encode_bulk_entry(item, &mut buf)?;
            self.write_entry(&item.index, &buf)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for partition in self.open.values_mut() {
            partition.writer.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "bulk_file"
    }
}

impl Drop for BulkFileWriter {
    fn drop(&mut self) {
        if let Err(e) = self.close_all() {
            eprintln!("[LOGGER ERROR] Failed to close partitions in {}: {}", self.dir.display(), e);
        }
    }
}

/// `applog_2024-03-05` -> `applog`
fn partition_key(index: &str) -> &str {
    index.rsplit_once('_').map_or(index, |(prefix, _)| prefix)
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

fn gzip_into(src: &Path, dst: &Path) -> io::Result<()> {
    let mut reader = BufReader::with_capacity(COPY_BUFFER, File::open(src)?);
    let output = BufWriter::with_capacity(COPY_BUFFER, File::create(dst)?);
    let mut encoder = GzEncoder::new(output, Compression::default());
    io::copy(&mut reader, &mut encoder)?;
    encoder.finish()?.flush()
}

fn append_file(src: &Path, dst: &Path) -> io::Result<()> {
    let mut target = OpenOptions::new().append(true).open(dst)?;
    let mut source = File::open(src)?;
    io::copy(&mut source, &mut target)?;
    target.flush()
}

/// Gzip a closed partition to `<path>.gz` and remove the original.
///
/// The archive is written to a temporary file first. If `<path>.gz`
/// already exists the new data is appended as another gzip member.
fn compress_file(path: &Path) -> Result<PathBuf> {
    let gz_path = with_suffix(path, ".gz");
    let tmp_path = with_suffix(path, ".gz.tmp");

    if let Err(e) = gzip_into(path, &tmp_path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(LoggerError::io_operation(
            "compressing partition",
            path.display().to_string(),
            e,
        ));
    }

    let placed = if gz_path.exists() {
        let result = append_file(&tmp_path, &gz_path);
        let _ = fs::remove_file(&tmp_path);
        result
    } else {
        fs::rename(&tmp_path, &gz_path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_path);
        })
    };
    placed.map_err(|e| {
        LoggerError::io_operation("placing compressed partition", gz_path.display().to_string(), e)
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compressed {} but failed to remove it: {}. \
             Both compressed and uncompressed versions exist.",
            path.display(),
            e
        );
    }

    Ok(gz_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, LogLevel};
    use flate2::read::MultiGzDecoder;
    use std::io::Read;
    use tempfile::tempdir;

    fn item(index: &str, msg: &str) -> IndexedEntry {
        IndexedEntry::new(index, LogEntry::new("q", "", LogLevel::Info, msg, "svc"))
    }

    fn gunzip(path: &Path) -> String {
        let mut out = String::new();
        MultiGzDecoder::new(File::open(path).unwrap())
            .read_to_string(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_partition_key() {
        assert_eq!(partition_key("applog_2024-03-05"), "applog");
        assert_eq!(partition_key("my_app_2024-03-05"), "my_app");
        assert_eq!(partition_key("plain"), "plain");
    }

    #[test]
    fn test_writes_action_and_document_lines() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = BulkFileWriter::new(dir.path())?;

        writer.write_batch(&[item("applog_2024-03-05", "one"), item("applog_2024-03-05", "two")])?;
        writer.flush()?;

        let content = fs::read_to_string(writer.partition_path("applog_2024-03-05"))?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], r#"{"index":{"_index":"applog_2024-03-05"}}"#);
        let doc: serde_json::Value = serde_json::from_str(lines[3])?;
        assert_eq!(doc["msg"], "two");
        Ok(())
    }

    #[test]
    fn test_rolls_and_compresses_previous_day() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = BulkFileWriter::new(dir.path())?.with_compression(true);

        writer.write_batch(&[item("applog_2024-03-05", "day one")])?;
        writer.write_batch(&[item("applog_2024-03-06", "day two")])?;
        writer.flush()?;

        let day_one = writer.partition_path("applog_2024-03-05");
        assert!(!day_one.exists());
        let archived = gunzip(&with_suffix(&day_one, ".gz"));
        assert!(archived.contains("day one"));

        assert_eq!(writer.open_partitions(), vec!["applog_2024-03-06"]);
        let current = fs::read_to_string(writer.partition_path("applog_2024-03-06"))?;
        assert!(current.contains("day two"));
        Ok(())
    }

    #[test]
    fn test_prefixes_are_independent() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = BulkFileWriter::new(dir.path())?.with_compression(true);

        writer.write_batch(&[
            item("applog_2024-03-05", "a"),
            item("audit_2024-03-05", "b"),
            item("applog_2024-03-05", "c"),
        ])?;

        assert_eq!(
            writer.open_partitions(),
            vec!["applog_2024-03-05", "audit_2024-03-05"]
        );
        Ok(())
    }

    #[test]
    fn test_late_entry_appends_to_archive() -> Result<()> {
        let dir = tempdir()?;
        let mut writer = BulkFileWriter::new(dir.path())?.with_compression(true);

        writer.write_batch(&[item("applog_2024-03-05", "early")])?;
        writer.write_batch(&[item("applog_2024-03-06", "next day")])?;
        writer.write_batch(&[item("applog_2024-03-05", "straggler")])?;

        assert_eq!(writer.open_partitions(), vec!["applog_2024-03-06"]);
        let archived = gunzip(&with_suffix(&writer.partition_path("applog_2024-03-05"), ".gz"));
        assert!(archived.contains("early"));
        assert!(archived.contains("straggler"));
        Ok(())
    }

    #[test]
    fn test_partition_is_locked() -> Result<()> {
        let dir = tempdir()?;
        let mut first = BulkFileWriter::new(dir.path())?;
        let mut second = BulkFileWriter::new(dir.path())?;

        first.write_batch(&[item("applog_2024-03-05", "owner")])?;
        let err = second
            .write_batch(&[item("applog_2024-03-05", "intruder")])
            .unwrap_err();
        assert!(matches!(err, LoggerError::PartitionLockError { .. }));

        first.close_all()?;
        second.write_batch(&[item("applog_2024-03-05", "after release")])?;
        Ok(())
    }
}
