//! Source-location annotation for log entries
//!
//! The public logging methods are `#[track_caller]`, so the location they
//! see is always the user's call site no matter how deep the logger's own
//! call chain is. The logging macros additionally record the enclosing
//! function through [`function_name!`](crate::function_name).

use std::panic::Location;

/// Marker written to `code_info` when no usable call site is available
pub const RESOLUTION_FAILED: &str = "stack resolution failed";

/// Placeholder for the function segment when only file and line are known
pub const UNKNOWN_FUNCTION: &str = "?";

/// Where a log call was made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub function: Option<&'static str>,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(function: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            function: Some(function),
            file,
            line,
        }
    }

    /// Location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            function: None,
            file: location.file(),
            line: location.line(),
        }
    }

    fn is_resolvable(&self) -> bool {
        !self.file.is_empty() && self.line > 0
    }
}

/// Format `"[<function>] [<file>.<line>] "` for a call site.
///
/// Directories are stripped from the file. A missing or degenerate call
/// site yields [`RESOLUTION_FAILED`].
pub fn resolve(site: Option<&CallSite>) -> String {
    match site {
        Some(site) if site.is_resolvable() => format!(
            "[{}] [{}.{}] ",
            site.function.unwrap_or(UNKNOWN_FUNCTION),
            base_name(site.file),
            site.line
        ),
        _ => RESOLUTION_FAILED.to_string(),
    }
}

fn base_name(path: &str) -> &str {
    path.rsplit(&['/', '\\'][..]).next().unwrap_or(path)
}
