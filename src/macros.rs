//! Logging macros for ergonomic log message formatting.
//!
//! These macros take a logger, a correlation id and `format!`-style
//! arguments, and record the enclosing function in `code_info` along with
//! the file and line.
//!
//! # Examples
//!
//! ```
//! use index_logger::prelude::*;
//! use index_logger::{debugf, errorf, infof};
//!
//! let logger = Logger::new("applog", "svc-a", None);
//!
//! debugf!(logger, "req-1", "cache size {}", 128);
//! infof!(logger, "req-1", "user {} logged in", "alice");
//! errorf!(logger, "req-1", "upstream returned {}", 503);
//! ```

/// Path of the enclosing function, e.g. `my_crate::handlers::login`.
///
/// # Examples
///
/// ```
/// fn handler() -> &'static str {
///     index_logger::function_name!()
/// }
/// assert!(handler().ends_with("handler"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        match name.strip_suffix("::f") {
            Some(stripped) => stripped,
            None => name,
        }
    }};
}

/// Log at an explicit level.
///
/// # Examples
///
/// ```
/// # use index_logger::prelude::*;
/// # let logger = Logger::new("applog", "svc-a", None);
/// use index_logger::logf;
/// logf!(logger, LogLevel::Info, "req-7", "Simple message");
/// logf!(logger, LogLevel::Error, "req-7", "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $quick_id:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            ::std::option::Option::Some($crate::core::CallSite::new(
                $crate::function_name!(),
                ::std::file!(),
                ::std::line!(),
            )),
            $quick_id,
            ::std::format_args!($($arg)+),
        )
    };
}

/// Log a debug-level message. Never forwarded to the sink.
#[macro_export]
macro_rules! debugf {
    ($logger:expr, $quick_id:expr, $($arg:tt)+) => {
        $crate::logf!($logger, $crate::LogLevel::Debug, $quick_id, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! infof {
    ($logger:expr, $quick_id:expr, $($arg:tt)+) => {
        $crate::logf!($logger, $crate::LogLevel::Info, $quick_id, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! errorf {
    ($logger:expr, $quick_id:expr, $($arg:tt)+) => {
        $crate::logf!($logger, $crate::LogLevel::Error, $quick_id, $($arg)+)
    };
}
