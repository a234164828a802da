//! HTTP command endpoint: one envelope in, one response out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::error::ErrorResponse;
use crate::ws::{Envelope, Response};

/// `POST /commands` — Run a command over plain HTTP.
///
/// Same decode path and dispatch table as the WebSocket endpoint. Success
/// returns the usual success response; failures use the HTTP error body,
/// echoing `requestId` when it could be recovered.
#[utoipa::path(
    post,
    path = "/api/v1/commands",
    tag = "Commands",
    summary = "Dispatch a command",
    description = "Runs one command envelope through the dispatcher and returns its result.",
    request_body = Envelope,
    responses(
        (status = 200, description = "Command succeeded", body = Response),
        (status = 400, description = "Malformed envelope", body = ErrorResponse),
        (status = 404, description = "Unknown command", body = ErrorResponse),
    )
)]
pub async fn command_handler(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let envelope = match Envelope::decode(&body) {
        Ok(envelope) => envelope,
        Err((request_id, err)) => {
            tracing::debug!(error = %err, "rejected malformed http envelope");
            return err.into_response_with(request_id);
        }
    };

    tracing::debug!(command = %envelope.command, "dispatching http command");
    match state
        .dispatcher
        .dispatch(&envelope.command, &envelope.params())
    {
        Ok(data) => (
            StatusCode::OK,
            Json(Response::success(envelope.request_id, data)),
        )
            .into_response(),
        Err(err) => err.into_response_with(envelope.request_id),
    }
}

/// Command routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/commands", post(command_handler))
}
