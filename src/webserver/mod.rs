//! HTTP surface: REST endpoints, WebSocket transport and admission middleware

mod middleware;
mod server;
mod utils;

pub mod routes;
pub mod state;
pub mod ws;

pub use server::{build_app, start_server};
pub use state::AppState;
