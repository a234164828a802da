//! Router assembly and server lifecycle.
//!
//! Which transport is mounted is decided at compile time:
//!
//! - `ws` (default): WebSocket command endpoint at `/` and `/ws`, plus the
//!   HTTP command endpoint.
//! - `static-files` without `ws`: plain-HTTP static file server over
//!   [`GatewayConfig::static_dir`]. This mode speaks no command protocol.
//!
//! `/health` is mounted in every mode.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::AppState;
use crate::config::GatewayConfig;

/// Builds the full application router around `state`.
pub fn build_router(state: AppState) -> Router {
    let router = Router::new().merge(api::build_router());

    #[cfg(feature = "ws")]
    let router = {
        use axum::routing::get;

        use crate::ws::handler::ws_handler;

        router
            .route("/", get(ws_handler))
            .route("/ws", get(ws_handler))
    };

    #[cfg(all(feature = "static-files", not(feature = "ws")))]
    let router = router.fallback_service(tower_http::services::ServeDir::new(
        &state.config.static_dir,
    ));

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", api::openapi()),
    );

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds a listener on the configured address.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound.
pub async fn bind(config: &GatewayConfig) -> std::io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    Ok((listener, addr))
}

/// Serves `state` on `listener` until `shutdown` resolves.
///
/// When `shutdown` fires, the server stops accepting connections and
/// cancels [`AppState::shutdown`]. Each open WebSocket finishes the
/// message it is handling, sends a Close frame, and ends. This returns
/// once every connection has ended.
///
/// # Errors
///
/// Returns an I/O error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let token = state.shutdown.clone();
    let signalled = token.clone();
    let connections = state.connections.clone();
    let app = build_router(state);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            signalled.cancel();
        })
        .await;

    // Also reached if the accept loop fails before any signal.
    token.cancel();
    connections.close();
    tracing::info!(open = connections.len(), "waiting for ws connections to close");
    connections.wait().await;
    result
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
