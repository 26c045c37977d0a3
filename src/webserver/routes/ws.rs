/// WebSocket upgrade endpoint
///
/// `GET /api/ws` upgrades the connection and hands the socket to the hub
/// bridge in `webserver::ws`.
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::get,
    Router,
};

use crate::webserver::{state::AppState, ws};

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(ws_upgrade))
}

async fn ws_upgrade(upgrade: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    upgrade.on_upgrade(move |socket| ws::handle_connection(socket, state))
}
