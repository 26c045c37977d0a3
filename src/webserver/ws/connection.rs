/// WebSocket connection handler
///
/// Bridges one client socket to the hub:
/// - subscribes on upgrade and unregisters on exit
/// - forwards hub events to the client as JSON text frames
/// - answers client pings and tracks liveness with heartbeat pings
/// - closes the socket when the hub drops the subscription (eviction, shutdown)
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{
    hub::{Event, SubscriberState},
    logger::{self, LogTag},
    webserver::state::AppState,
};

use super::health::{ConnectionHealth, HealthConfig};

/// Messages a client may send
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping {
        #[serde(default)]
        id: Option<String>,
    },
}

/// Control replies; events use their own wire form
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },
    Error {
        message: String,
    },
}

type SocketSink = SplitSink<WebSocket, Message>;

/// Handle a WebSocket connection until either side ends it
pub async fn handle_connection(mut socket: WebSocket, state: AppState) {
    let mut subscription = match state.hub.subscribe().await {
        Ok(subscription) => subscription,
        Err(e) => {
            logger::warning(
                LogTag::Webserver,
                &format!("Rejecting websocket connection: {}", e),
            );
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };
    let id = subscription.id();

    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut health = ConnectionHealth::new(HealthConfig::from_config(&state.config));
    let mut health_tick = tokio::time::interval(Duration::from_secs(1));
    let mut sent: u64 = 0;

    logger::debug(LogTag::Webserver, &format!("Connection {} started", id));

    loop {
        tokio::select! {
            biased;

            event = subscription.recv() => {
                let Some(event) = event else {
                    // Hub closed our queue and it is drained
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if let Err(e) = forward_event(&mut ws_tx, &event).await {
                    logger::warning(
                        LogTag::Webserver,
                        &format!("Connection {}: failed to send event: {}", id, e),
                    );
                    break;
                }
                sent += 1;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        health.record_activity();
                        if let Err(e) = handle_client_message(&text, &mut ws_tx).await {
                            logger::warning(
                                LogTag::Webserver,
                                &format!("Connection {}: {}", id, e),
                            );
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        logger::debug(LogTag::Webserver, &format!("Connection {}: client closed", id));
                        break;
                    }
                    Some(Ok(_)) => health.record_activity(),
                    Some(Err(e)) => {
                        logger::warning(
                            LogTag::Webserver,
                            &format!("Connection {}: websocket error: {}", id, e),
                        );
                        break;
                    }
                }
            }

            _ = health_tick.tick() => {
                if health.is_idle() {
                    logger::warning(
                        LogTag::Webserver,
                        &format!(
                            "Connection {}: idle timeout ({}s)",
                            id,
                            health.seconds_since_activity()
                        ),
                    );
                    break;
                }

                if health.is_pong_overdue() {
                    logger::warning(LogTag::Webserver, &format!("Connection {}: pong timeout", id));
                    break;
                }

                if health.needs_ping() {
                    if ws_tx.send(Message::Ping(Vec::new())).await.is_err() {
                        break;
                    }
                    health.record_ping();
                }
            }
        }
    }

    // Stopped hub: nothing left to unregister
    let _ = state.hub.unregister(id).await;

    let reason = match subscription.state() {
        SubscriberState::Evicted => " (evicted: client too slow)",
        _ => "",
    };
    logger::debug(
        LogTag::Webserver,
        &format!("Connection {} closed{} (sent={})", id, reason, sent),
    );
}

async fn forward_event(ws_tx: &mut SocketSink, event: &Event) -> Result<(), String> {
    let json = event.to_json().map_err(|e| e.to_string())?;
    ws_tx
        .send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}

/// Reply to a client control message; unparseable input gets an error frame
async fn handle_client_message(text: &str, ws_tx: &mut SocketSink) -> Result<(), String> {
    let reply = match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::Ping { id }) => ServerMessage::Pong { id },
        Err(e) => ServerMessage::Error {
            message: format!("Invalid client message: {}", e),
        },
    };

    let json = serde_json::to_string(&reply).map_err(|e| format!("Serialization error: {}", e))?;
    ws_tx
        .send(Message::Text(json))
        .await
        .map_err(|e| format!("Send error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_ping_parses() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping","id":"42"}"#).unwrap();
        let ClientMessage::Ping { id } = msg;
        assert_eq!(id.as_deref(), Some("42"));

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
    }

    #[test]
    fn test_server_message_shape() {
        let pong = serde_json::to_value(ServerMessage::Pong { id: None }).unwrap();
        assert_eq!(pong, serde_json::json!({"type": "pong"}));

        let error = serde_json::to_value(ServerMessage::Error {
            message: "bad".to_string(),
        })
        .unwrap();
        assert_eq!(error["type"], "error");
    }
}
