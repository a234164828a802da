//! Axum WebSocket upgrade handler.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::{ConnectionSettings, run_connection};
use crate::app_state::AppState;

/// `GET /` and `GET /ws` — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = std::sync::Arc::clone(&state.dispatcher);
    let settings = ConnectionSettings::from(state.config.as_ref());
    let shutdown = state.shutdown.child_token();
    let connections = state.connections.clone();

    ws.max_message_size(state.config.max_message_bytes)
        .on_upgrade(move |socket| {
            connections.track_future(run_connection(socket, dispatcher, settings, shutdown))
        })
}
