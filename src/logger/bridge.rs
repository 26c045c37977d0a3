//! Bridge from the `log` facade into the tagged logger
//!
//! Any dependency that emits through the `log` facade ends up here under
//! `LogTag::External(target)`, with the same console format and level filtering.
//! Crates that only emit `tracing` events are not captured.

use super::levels::LogLevel;
use super::tags::LogTag;

struct LogBridge;

static BRIDGE: LogBridge = LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        let tag = LogTag::External(metadata.target().to_string());
        super::core::should_log(&tag, LogLevel::from(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        let tag = LogTag::External(record.target().to_string());
        super::core::log_internal(tag, LogLevel::from(record.level()), &record.args().to_string());
    }

    fn flush(&self) {}
}

/// Install the bridge as the global `log` logger. Safe to call more than once.
pub fn install() {
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(log::LevelFilter::Trace);
    }
}
