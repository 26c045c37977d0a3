pub mod arguments;
pub mod cache;
pub mod config;
pub mod errors;
pub mod hub;
pub mod logger;
pub mod metrics;
pub mod rate_limiter;
pub mod tasks;
#[cfg(feature = "web")]
pub mod webserver;
