//! HTTP API layer: route handlers, router composition, OpenAPI document.
//!
//! System endpoints are mounted at the root; the command endpoint, when the
//! `ws` feature is enabled, under `/api/v1`.

pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the always-mounted system endpoints.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "hyperon-server", description = "Hyperon command-dispatch server"),
    paths(handlers::system::health_handler),
    components(schemas(handlers::system::HealthResponse)),
    tags((name = "System", description = "Service health"))
)]
pub struct ApiDoc;

/// OpenAPI document for the HTTP command endpoint.
#[cfg(feature = "ws")]
#[derive(Debug, OpenApi)]
#[openapi(
    paths(handlers::command::command_handler),
    components(schemas(crate::ws::Envelope, crate::ws::Response, crate::error::ErrorResponse, crate::error::ErrorBody)),
    tags((name = "Commands", description = "Command dispatch over HTTP"))
)]
pub struct CommandApiDoc;

/// Returns the OpenAPI document for every mounted endpoint.
#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[allow(unused_mut)]
    let mut doc = ApiDoc::openapi();
    #[cfg(feature = "ws")]
    doc.merge(CommandApiDoc::openapi());
    doc
}

/// Builds the complete HTTP API router.
pub fn build_router() -> Router<AppState> {
    let router = Router::new().merge(handlers::system::routes());
    #[cfg(feature = "ws")]
    let router = router.nest("/api/v1", handlers::routes());
    router
}
