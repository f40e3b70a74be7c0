//! Basic logger usage example
//!
//! Demonstrates a console-only logger writing one JSON line per call.
//!
//! Run with: cargo run --example basic_usage

use index_logger::prelude::*;
use index_logger::{debugf, errorf, infof};

fn handle_login(logger: &Logger, user: &str) {
    infof!(logger, "req-42", "user {} logged in", user);
}

fn main() -> Result<()> {
    eprintln!("=== index_logger - Basic Usage Example ===\n");

    // No sink: every entry goes to stdout only
    let logger = Logger::new("applog", "svc-a", None);

    eprintln!("1. Logging at each level:");
    debugf!(logger, "req-1", "cache size {}", 128);
    infof!(logger, "req-1", "listening on port {}", 8080);
    errorf!(logger, "req-1", "upstream returned {}", 503);

    eprintln!("\n2. code_info records the enclosing function:");
    handle_login(&logger, "alice");

    eprintln!("\n3. Method form (function shown as `?`):");
    logger.infof("req-2", format_args!("plain method call"));

    logger.flush()?;
    eprintln!("\n=== Example completed successfully! ===");
    Ok(())
}
