//! Structured logging for dashhub
//!
//! This module provides a small, ergonomic logging API with:
//! - Standard log levels (Error/Warning/Info/Debug/Verbose)
//! - Per-module debug control via --debug-<module> flags
//! - Colored console output
//! - A `log` facade bridge so third-party crates share the same output
//!
//! ## Usage
//!
//! ```rust
//! use dashhub::logger::{self, LogTag};
//!
//! logger::error(LogTag::Hub, "Hub loop terminated unexpectedly");
//! logger::warning(LogTag::RateLimit, "Client 10.0.0.1 rate limited");
//! logger::info(LogTag::System, "Server started");
//! logger::debug(LogTag::Cache, "Swept 12 expired entries"); // Only if --debug-cache
//! ```
//!
//! Call `logger::init()` once at startup, before any logging occurs.

mod bridge;
mod config;
mod core;
mod format;
mod levels;
mod tags;

pub use config::{config_from_args, get_logger_config, set_logger_config, LoggerConfig};
pub use levels::LogLevel;
pub use tags::LogTag;

/// Initialize the logger system
///
/// Scans command-line arguments for debug flags and installs the `log` bridge.
pub fn init() {
    config::init_from_args();
    bridge::install();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (shown unless filtered by level)
pub fn warning(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level
///
/// Only shown when the `--debug-<module>` flag for the tag is provided.
pub fn debug(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Debug, message);
}

/// Log at VERBOSE level (only with --verbose)
pub fn verbose(tag: LogTag, message: &str) {
    core::log_internal(tag, LogLevel::Verbose, message);
}

/// Whether a debug message for `tag` would be printed
///
/// Lets callers skip building expensive debug strings.
pub fn is_debug_enabled(tag: &LogTag) -> bool {
    core::should_log(tag, LogLevel::Debug)
}
