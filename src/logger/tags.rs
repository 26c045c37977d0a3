/// Log tags identify the subsystem a message comes from.
///
/// Each tag maps to a `--debug-<key>` flag that enables its debug output.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Hub,
    RateLimit,
    Cache,
    Metrics,
    Webserver,
    /// Records forwarded from third-party crates through the `log` facade
    External(String),
}

impl LogTag {
    /// Key used in `--debug-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Hub => "hub".to_string(),
            LogTag::RateLimit => "ratelimit".to_string(),
            LogTag::Cache => "cache".to_string(),
            LogTag::Metrics => "metrics".to_string(),
            LogTag::Webserver => "webserver".to_string(),
            LogTag::External(_) => "external".to_string(),
        }
    }

    /// Uncolored label for plain output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::External(target) => {
                // Only the crate name, "mio::poll" -> "MIO"
                target
                    .split("::")
                    .next()
                    .unwrap_or(target)
                    .to_uppercase()
            }
            other => other.to_debug_key().to_uppercase(),
        }
    }
}
