use axum::{
    extract::State,
    http::{header, Method},
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

use crate::webserver::{middleware, state::AppState};

pub mod metrics;
pub mod widgets;
pub mod ws;

/// Build the full router: API routes, admission and tracking middleware, CORS
///
/// Layer order, outermost first: CORS (preflights never cost tokens), rate
/// limit, request tracking, handlers.
pub fn create_router(state: AppState) -> Router {
    let router = Router::new()
        .nest("/api", api_routes())
        .layer(from_fn_with_state(state.clone(), middleware::track_requests))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit));

    let router = if state.config.cors_enabled {
        router.layer(cors_layer())
    } else {
        router
    };

    router.with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health))
        .merge(metrics::routes())
        .merge(widgets::routes())
        .merge(ws::routes())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(3600))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hub::{ChangeAction, EventKind, EventPayload};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use tower::ServiceExt;

    fn test_state(requests_per_minute: f64) -> AppState {
        let mut config = Config::default();
        config.rate_limit.requests_per_minute = requests_per_minute;
        AppState::from_config(&config)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state(60.0));
        let response = app.oneshot(get_request("/api/v1/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_rate_limit_returns_429_per_client() {
        let state = test_state(2.0);
        let app = create_router(state.clone());

        let from = |ip: &str| {
            Request::builder()
                .uri("/api/v1/health")
                .header("X-Forwarded-For", ip)
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..2 {
            let response = app.clone().oneshot(from("10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app.clone().oneshot(from("10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], middleware::RATE_LIMITED_MESSAGE.as_bytes());

        // Another client still has its own budget
        let response = app.clone().oneshot(from("10.0.0.2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let stats = state.requests.snapshot();
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.rate_limited, 1);
        state.hub.stop().await;
    }

    #[tokio::test]
    async fn test_disabled_rate_limit_admits_everything() {
        let mut config = Config::default();
        config.rate_limit.enabled = false;
        config.rate_limit.requests_per_minute = 1.0;
        let app = create_router(AppState::from_config(&config));

        for _ in 0..5 {
            let response = app.clone().oneshot(get_request("/api/v1/health")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = create_router(test_state(60.0));
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/metrics")
            .header(header::ORIGIN, "http://dashboard.local")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_widget_data_flow() {
        let state = test_state(600.0);
        let app = create_router(state.clone());
        let mut subscription = state.hub.subscribe().await.unwrap();

        let response = app
            .clone()
            .oneshot(json_request(
                Method::POST,
                "/api/v1/widgets/weather/data",
                json!({"key": "today", "value": {"temp": 21}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["key"], "today");

        let event = subscription.recv().await.unwrap();
        assert_eq!(event.kind(), EventKind::DataChanged);
        assert_eq!(event.scope(), Some("weather"));

        let response = app
            .clone()
            .oneshot(get_request("/api/v1/widgets/weather/data/today"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["value"]["temp"], 21);

        let response = app
            .clone()
            .oneshot(get_request("/api/v1/metrics/widgets/weather"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["update_count"], 1);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/v1/widgets/weather/data/today")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let event = subscription.recv().await.unwrap();
        match event.payload() {
            EventPayload::DataChanged(change) => assert_eq!(change.action, ChangeAction::Deleted),
            other => panic!("unexpected payload {:?}", other),
        }

        let response = app
            .oneshot(get_request("/api/v1/widgets/weather/data/today"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        state.hub.stop().await;
    }

    #[tokio::test]
    async fn test_save_requires_key() {
        let app = create_router(test_state(60.0));
        let response = app
            .oneshot(json_request(
                Method::POST,
                "/api/v1/widgets/notes/data",
                json!({"key": "", "value": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "MISSING_KEY");
    }

    #[tokio::test]
    async fn test_metrics_endpoints() {
        let state = test_state(60.0);
        state
            .metrics
            .record_update("calendar", Duration::from_millis(12));
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(get_request("/api/v1/metrics"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        for section in ["system", "widgets", "api", "hub", "cache"] {
            assert!(body.get(section).is_some(), "missing {}", section);
        }
        assert_eq!(body["widgets"]["calendar"]["update_count"], 1);
        assert!(body["api"]["rate_limiter"].is_object());

        let response = app
            .oneshot(get_request("/api/v1/metrics/widgets/unknown"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
