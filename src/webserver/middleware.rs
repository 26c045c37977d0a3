/// Webserver middleware
///
/// - `rate_limit`: per-client admission through the token-bucket limiter
/// - `track_requests`: latency accounting for admitted requests
use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::time::Instant;

use crate::{
    logger::{self, LogTag},
    rate_limiter::{RequestContext, FORWARDED_FOR_HEADER, REAL_IP_HEADER},
    webserver::state::AppState,
};

/// Body of the 429 response
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded";

/// Rate limit middleware
///
/// Every request costs one token from its client's bucket. An empty bucket
/// answers `429 Too Many Requests` without reaching the handler.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.requests.record_request();

    if !state.rate_limit_enabled {
        return next.run(request).await;
    }

    let ctx = request_context(&request);
    if state.limiter.allow_request(&ctx) {
        return next.run(request).await;
    }

    state.requests.record_rate_limited();
    logger::verbose(
        LogTag::Webserver,
        &format!("429 for {} {}", request.method(), request.uri().path()),
    );
    (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_MESSAGE).into_response()
}

/// Request tracking middleware
pub async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    state.requests.record_latency(elapsed);
    logger::verbose(
        LogTag::Webserver,
        &format!(
            "{} {} -> {} ({}ms)",
            method,
            path,
            response.status().as_u16(),
            elapsed.as_millis()
        ),
    );
    response
}

/// Extract the limiter's view of a request
///
/// The connection address is only present when the server was started with
/// connect info.
fn request_context(request: &Request) -> RequestContext {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    RequestContext {
        forwarded_for: header(FORWARDED_FOR_HEADER),
        real_ip: header(REAL_IP_HEADER),
        remote_addr: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
    }
}
