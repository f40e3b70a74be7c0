//! Indexer configuration

use crate::core::{LoggerError, OverflowPolicy, Result, DEFAULT_SINK_CAPACITY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for a [`BatchIndexer`](super::BatchIndexer)
///
/// Deserializes from JSON with millisecond durations; missing fields take
/// their defaults.
///
/// # Example
///
/// ```
/// use index_logger::IndexerConfig;
/// use std::time::Duration;
///
/// let config = IndexerConfig::from_json(r#"{"batch_size": 200, "flush_interval_ms": 250}"#)?;
/// assert_eq!(config.batch_size, 200);
/// assert_eq!(config.flush_interval, Duration::from_millis(250));
/// # Ok::<(), index_logger::LoggerError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Sink queue capacity
    pub capacity: usize,

    /// Entries per delivered batch
    pub batch_size: usize,

    /// Longest an entry waits in a partial batch
    #[serde(rename = "flush_interval_ms", with = "duration_ms")]
    pub flush_interval: Duration,

    /// Extra delivery attempts after the first failure
    pub max_retries: u32,

    #[serde(rename = "retry_backoff_ms", with = "duration_ms")]
    pub retry_backoff: Duration,

    /// What producers do when the queue is full
    pub overflow_policy: OverflowPolicy,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_SINK_CAPACITY,
            batch_size: 500,
            flush_interval: Duration::from_secs(1),
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl IndexerConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LoggerError::config("IndexerConfig", "capacity must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(LoggerError::config("IndexerConfig", "batch_size must be greater than 0"));
        }
        if self.flush_interval.is_zero() {
            return Err(LoggerError::config(
                "IndexerConfig",
                "flush_interval must be greater than 0",
            ));
        }
        if let OverflowPolicy::BlockWithTimeout(timeout) = self.overflow_policy {
            if timeout.is_zero() {
                return Err(LoggerError::config(
                    "IndexerConfig",
                    "BlockWithTimeout needs a non-zero timeout; use DropNewest instead",
                ));
            }
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
