//! HTTP endpoint handlers.

#[cfg(feature = "ws")]
pub mod command;
pub mod system;

#[cfg(feature = "ws")]
use axum::Router;

#[cfg(feature = "ws")]
use crate::app_state::AppState;

/// Composes the versioned routes under `/api/v1`.
#[cfg(feature = "ws")]
pub fn routes() -> Router<AppState> {
    Router::new().merge(command::routes())
}
