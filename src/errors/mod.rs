/// Error types for the dashhub core
///
/// Admission denials, cache misses and backpressure evictions are ordinary
/// outcomes and never show up here. These enums cover the few conditions a
/// caller genuinely has to handle:
/// - submitting work to a hub whose loop has been stopped
/// - event payloads that do not match their declared kind
/// - configuration files that cannot be read or parsed
use thiserror::Error;

// =============================================================================
// HUB ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum HubError {
    /// The actor loop is no longer running; nothing was submitted
    #[error("hub is stopped")]
    Stopped,

    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] PayloadError),
}

// =============================================================================
// PAYLOAD ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("unknown event kind '{0}'")]
    UnknownKind(String),

    #[error("payload does not match kind '{kind}': {source}")]
    Mismatch {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload is not serializable: {0}")]
    Serialize(#[source] serde_json::Error),
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("failed to write config file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config already initialized")]
    AlreadyInitialized,

    #[error("config not initialized, call load_config() first")]
    NotInitialized,
}
