//! Rate-limit key derivation from request metadata
//!
//! Precedence: first `X-Forwarded-For` entry, then `X-Real-IP`, then the raw
//! connection address. Header values that are not IP addresses are skipped
//! rather than used verbatim, so a garbage header can't mint fresh keys.

use std::net::IpAddr;

pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Key used when nothing usable identifies the caller
pub const FALLBACK_KEY: &str = "unknown";

/// The parts of a request the limiter looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub forwarded_for: Option<String>,
    pub real_ip: Option<String>,
    /// Connection address as reported by the transport, e.g. "127.0.0.1:5123"
    pub remote_addr: Option<String>,
}

impl RequestContext {
    pub fn from_remote(remote_addr: impl Into<String>) -> Self {
        Self {
            remote_addr: Some(remote_addr.into()),
            ..Self::default()
        }
    }

    pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
        self.forwarded_for = Some(value.into());
        self
    }

    pub fn with_real_ip(mut self, value: impl Into<String>) -> Self {
        self.real_ip = Some(value.into());
        self
    }
}

/// Derive the rate-limit key for a request
pub fn resolve_key(ctx: &RequestContext) -> String {
    if let Some(ip) = ctx
        .forwarded_for
        .as_deref()
        .and_then(|value| value.split(',').next())
        .and_then(parse_ip)
    {
        return ip;
    }

    if let Some(ip) = ctx.real_ip.as_deref().and_then(parse_ip) {
        return ip;
    }

    match ctx.remote_addr.as_deref().map(str::trim) {
        Some(addr) if !addr.is_empty() => addr.to_string(),
        _ => FALLBACK_KEY.to_string(),
    }
}

/// Canonical text form of an IP address, or None if `raw` isn't one
fn parse_ip(raw: &str) -> Option<String> {
    raw.trim().parse::<IpAddr>().ok().map(|ip| ip.to_string())
}
