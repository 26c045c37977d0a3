/// WebSocket transport for the hub
///
/// - `connection`: per-socket loop bridging a hub subscription to the client
/// - `health`: heartbeat and idle tracking
pub mod connection;
pub mod health;

pub use connection::handle_connection;
