/// Core logging implementation with automatic filtering
///
/// Filtering rules:
/// 1. Errors are always shown
/// 2. Anything above the minimum level threshold is dropped
/// 3. Debug level requires --debug-<module> for that tag
/// 4. Verbose level requires --verbose
use super::config::{is_debug_enabled_for_tag, min_level};
use super::levels::LogLevel;
use super::tags::LogTag;

pub fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    if level == LogLevel::Error {
        return true;
    }

    let threshold = min_level();
    if level > threshold {
        return false;
    }

    match level {
        LogLevel::Debug => threshold == LogLevel::Verbose || is_debug_enabled_for_tag(tag),
        _ => true,
    }
}

/// Check the filter, then hand the message to the formatter
pub fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    super::format::format_and_log(&tag, level, message);
}
