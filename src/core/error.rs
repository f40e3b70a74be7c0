//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Sink queue full with capacity details
    #[error("Sink queue full: {current}/{max} entries buffered")]
    QueueFull { current: usize, max: usize },

    /// The indexer side of the sink channel is gone
    #[error("Sink channel disconnected")]
    SinkDisconnected,

    /// Indexer already stopped
    #[error("Indexer already stopped")]
    IndexerStopped,

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Partition file error with path
    #[error("Partition file error for '{path}': {message}")]
    PartitionError { path: String, message: String },

    /// Partition lock error
    #[error("Failed to acquire lock on partition '{path}'")]
    PartitionLockError { path: String },

    /// Writer error (generic)
    #[error("Writer error: {0}")]
    WriterError(String),

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A batch could not be delivered after all retries
    #[error("Batch of {size} entries failed after {attempts} attempts: {message}")]
    BatchFailed {
        size: usize,
        attempts: u32,
        message: String,
    },
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a queue full error with buffer details
    pub fn queue_full(current: usize, max: usize) -> Self {
        LoggerError::QueueFull { current, max }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a partition file error
    pub fn partition(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::PartitionError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a partition lock error
    pub fn partition_lock(path: impl Into<String>) -> Self {
        LoggerError::PartitionLockError { path: path.into() }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a batch delivery error
    pub fn batch_failed(size: usize, attempts: u32, message: impl Into<String>) -> Self {
        LoggerError::BatchFailed {
            size,
            attempts,
            message: message.into(),
        }
    }

    /// Create a writer error (generic)
    pub fn writer<S: Into<String>>(msg: S) -> Self {
        LoggerError::WriterError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::queue_full(100, 1000);
        assert!(matches!(err, LoggerError::QueueFull { .. }));

        let err = LoggerError::config("IndexerConfig", "batch_size must be > 0");
        assert!(matches!(err, LoggerError::InvalidConfiguration { .. }));

        let err = LoggerError::partition("/var/log/applog_2024-03-05.ndjson", "Permission denied");
        assert!(matches!(err, LoggerError::PartitionError { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::queue_full(100, 1000);
        assert_eq!(err.to_string(), "Sink queue full: 100/1000 entries buffered");

        let err = LoggerError::batch_failed(50, 3, "connection refused");
        assert_eq!(
            err.to_string(),
            "Batch of 50 entries failed after 3 attempts: connection refused"
        );

        let err = LoggerError::formatter("JSON", "Invalid field type");
        assert_eq!(err.to_string(), "Formatter error (JSON): Invalid field type");

        assert_eq!(LoggerError::SinkDisconnected.to_string(), "Sink channel disconnected");
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("compressing partition", "cannot open file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("compressing partition"));
        assert!(err.to_string().contains("cannot open file"));
    }
}
