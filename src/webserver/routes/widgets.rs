/// Widget data endpoints
///
/// Widget data lives in the TTL cache under `<widget_id>/<key>`. Every write
/// or delete is announced to live clients as a `data_changed` event and
/// reported to the metrics collector.
///
/// - `POST /api/v1/widgets/:id/data` with `{"key", "value", "ttl_secs"?}`
/// - `GET /api/v1/widgets/:id/data/:key`
/// - `DELETE /api/v1/widgets/:id/data/:key`
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

use crate::{
    hub::{ChangeAction, DataChange, EventPayload},
    logger::{self, LogTag},
    webserver::{state::AppState, utils::error_response},
};

#[derive(Debug, Deserialize)]
pub struct SaveWidgetData {
    pub key: String,
    pub value: Value,
    /// Overrides the cache's default TTL
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/widgets/:id/data", post(save_data))
        .route("/v1/widgets/:id/data/:key", get(get_data).delete(delete_data))
}

fn data_key(widget_id: &str, key: &str) -> String {
    format!("{}/{}", widget_id, key)
}

async fn save_data(
    State(state): State<AppState>,
    Path(widget_id): Path<String>,
    Json(body): Json<SaveWidgetData>,
) -> Response {
    if body.key.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "MISSING_KEY", "Missing 'key' field");
    }

    let started = Instant::now();
    let cache_key = data_key(&widget_id, &body.key);
    match body.ttl_secs {
        Some(ttl) => state
            .cache
            .set_with_ttl(cache_key, body.value, Duration::from_secs(ttl)),
        None => state.cache.set(cache_key, body.value),
    }

    announce_change(&state, &widget_id, &body.key, ChangeAction::Updated).await;
    state.metrics.record_update(&widget_id, started.elapsed());

    (
        StatusCode::CREATED,
        Json(json!({
            "status": "created",
            "widget_id": widget_id,
            "key": body.key,
        })),
    )
        .into_response()
}

async fn get_data(
    State(state): State<AppState>,
    Path((widget_id, key)): Path<(String, String)>,
) -> Response {
    match state.cache.get(&data_key(&widget_id, &key)) {
        Some(value) => Json(json!({
            "widget_id": widget_id,
            "key": key,
            "value": value,
        }))
        .into_response(),
        None => error_response(StatusCode::NOT_FOUND, "DATA_NOT_FOUND", "Widget data not found"),
    }
}

async fn delete_data(
    State(state): State<AppState>,
    Path((widget_id, key)): Path<(String, String)>,
) -> Response {
    state.cache.delete(&data_key(&widget_id, &key));
    announce_change(&state, &widget_id, &key, ChangeAction::Deleted).await;
    StatusCode::NO_CONTENT.into_response()
}

/// Tell live clients about a change; failures only affect the widget's error count
async fn announce_change(state: &AppState, widget_id: &str, key: &str, action: ChangeAction) {
    let payload = EventPayload::DataChanged(DataChange {
        entity: widget_id.to_string(),
        action,
        id: Some(key.to_string()),
    });

    if let Err(e) = state.hub.broadcast(Some(widget_id), payload).await {
        logger::warning(
            LogTag::Webserver,
            &format!("Could not announce change to {}/{}: {}", widget_id, key, e),
        );
        state.metrics.record_error(widget_id, &e);
    }
}
