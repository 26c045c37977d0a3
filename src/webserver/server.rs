/// Axum webserver implementation
///
/// Binds the listener, serves the router with client addresses attached (the
/// rate limiter falls back to them) and shuts down gracefully on request.
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use crate::{
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Start the webserver
///
/// Runs until `shutdown` is notified.
pub async fn start_server(state: AppState, shutdown: Arc<Notify>) -> Result<(), String> {
    let host = state.config.host.clone();
    let port = state.config.port;

    logger::debug(
        LogTag::Webserver,
        &format!("Starting webserver on {}:{}", host, port),
    );

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::AddrInUse => format!(
                "Failed to bind to {}:{}: Address already in use\n\
                 \n\
                 Another dashhub instance (or another service) is using this port.\n\
                 Stop it or pick a different port with --port.",
                host, port
            ),
            std::io::ErrorKind::PermissionDenied => format!(
                "Failed to bind to {}:{}: Permission denied\n\
                 \n\
                 Port {} requires elevated privileges on this system.\n\
                 Consider using a port above 1024.",
                host, port, port
            ),
            _ => format!("Failed to bind to {}:{}: {}", host, port, e),
        })?;

    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to read bound address: {}", e))?;
    logger::info(
        LogTag::Webserver,
        &format!("Webserver listening on http://{} (websocket: /api/ws)", addr),
    );

    let shutdown_signal = async move {
        shutdown.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(
        listener,
        build_app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await
    .map_err(|e| format!("Server error: {}", e))?;

    logger::debug(LogTag::Webserver, "Webserver stopped gracefully");
    Ok(())
}

/// Build the Axum application with all routes and middleware
pub fn build_app(state: AppState) -> Router {
    routes::create_router(state)
}
