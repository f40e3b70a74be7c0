//! Log entry structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// One structured log event
///
/// Field order is the console line's field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub quick_id: String,
    pub code_info: String,
    pub level: LogLevel,
    pub msg: String,
    pub server_name: String,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    /// Build an entry stamped with the current local time.
    pub fn new(
        quick_id: impl Into<String>,
        code_info: impl Into<String>,
        level: LogLevel,
        msg: impl Into<String>,
        server_name: impl Into<String>,
    ) -> Self {
        Self {
            quick_id: quick_id.into(),
            code_info: code_info.into(),
            level,
            msg: msg.into(),
            server_name: server_name.into(),
            timestamp: Local::now(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Daily index partition for this entry, `<prefix>_<YYYY-MM-DD>`.
    pub fn index_name(&self, prefix: &str) -> String {
        index_name(prefix, &self.timestamp)
    }
}

/// Format the daily index name for a timestamp in its own timezone.
pub fn index_name<Tz: TimeZone>(prefix: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("{}_{}", prefix, at.format("%Y-%m-%d"))
}

/// Unit handed to the indexing sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedEntry {
    pub index: String,
    pub data: LogEntry,
}

impl IndexedEntry {
    pub fn new(index: impl Into<String>, data: LogEntry) -> Self {
        Self {
            index: index.into(),
            data,
        }
    }

    /// Pair an entry with the daily partition derived from its timestamp.
    pub fn partitioned(prefix: &str, data: LogEntry) -> Self {
        let index = data.index_name(prefix);
        Self { index, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LogEntry {
        LogEntry::new("req-42", "[main] [main.rs.10] ", LogLevel::Info, "hello", "svc-a")
    }

    #[test]
    fn test_index_name_uses_entry_date() {
        let at = Local.with_ymd_and_hms(2024, 3, 5, 23, 59, 59).unwrap();
        let entry = sample().with_timestamp(at);
        assert_eq!(entry.index_name("applog"), "applog_2024-03-05");

        let indexed = IndexedEntry::partitioned("applog", entry.clone());
        assert_eq!(indexed.index, "applog_2024-03-05");
        assert_eq!(indexed.data, entry);
    }

    #[test]
    fn test_index_name_with_fixed_offset() {
        let at = chrono::FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 12, 31, 0, 0, 1)
            .unwrap();
        assert_eq!(index_name("gcl", &at), "gcl_2024-12-31");
    }

    #[test]
    fn test_serialized_field_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        let positions: Vec<usize> = [
            "\"quick_id\"",
            "\"code_info\"",
            "\"level\"",
            "\"msg\"",
            "\"server_name\"",
            "\"timestamp\"",
        ]
        .iter()
        .map(|key| json.find(key).expect("field present"))
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", json);
    }

    #[test]
    fn test_indexed_entry_shape() {
        let value = serde_json::to_value(IndexedEntry::new("applog_2024-03-05", sample())).unwrap();
        assert_eq!(value["index"], "applog_2024-03-05");
        assert_eq!(value["data"]["msg"], "hello");
        assert_eq!(value["data"]["level"], "info");
    }
}
