//! Appender implementations

pub mod console;
pub mod memory;

pub use console::{ConsoleAppender, ConsoleStream};
pub use memory::MemoryAppender;

// Re-export trait for convenience
pub use crate::core::Appender;
