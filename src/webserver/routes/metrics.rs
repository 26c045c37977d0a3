/// Metrics endpoints
///
/// - `GET /api/v1/metrics`: system snapshot, every widget, API and hub counters
/// - `GET /api/v1/metrics/widgets/:id`: one widget, 404 if it never reported
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::collections::HashMap;

use crate::{
    cache::CacheStats,
    hub::HubMetricsSnapshot,
    metrics::{RequestStatsSnapshot, SystemMetrics, WidgetMetrics},
    rate_limiter::RateLimiterStats,
    webserver::{state::AppState, utils::error_response},
};

// =============================================================================
// RESPONSE TYPES
// =============================================================================

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub system: SystemMetrics,
    pub widgets: HashMap<String, WidgetMetrics>,
    pub api: ApiMetrics,
    pub hub: HubMetricsSnapshot,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct ApiMetrics {
    #[serde(flatten)]
    pub requests: RequestStatsSnapshot,
    pub rate_limiter: RateLimiterStats,
}

// =============================================================================
// HANDLERS
// =============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/metrics", get(all_metrics))
        .route("/v1/metrics/widgets/:id", get(widget_metrics))
}

async fn all_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        system: state.metrics.get_system_metrics(),
        widgets: state.metrics.get_all_metrics(),
        api: ApiMetrics {
            requests: state.requests.snapshot(),
            rate_limiter: state.limiter.stats(),
        },
        hub: state.hub.metrics(),
        cache: state.cache.stats(),
    })
}

async fn widget_metrics(State(state): State<AppState>, Path(widget_id): Path<String>) -> Response {
    match state.metrics.get_metrics(&widget_id) {
        Some(metrics) => Json(metrics).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "WIDGET_NOT_FOUND", "Widget not found"),
    }
}
