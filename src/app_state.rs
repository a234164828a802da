//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Command table shared by every connection.
    pub dispatcher: Arc<Dispatcher>,
    /// Server configuration.
    pub config: Arc<GatewayConfig>,
    /// When the server started, for uptime reporting.
    pub started_at: Instant,
    /// Cancelled when the server begins shutting down. Every WebSocket
    /// connection watches a child of this token.
    pub shutdown: CancellationToken,
    /// Upgraded WebSocket connections. Axum stops tracking a connection
    /// once it is upgraded, so shutdown waits on this instead.
    pub connections: TaskTracker,
}

impl AppState {
    /// Creates state around the given dispatcher and configuration.
    #[must_use]
    pub fn new(dispatcher: Dispatcher, config: GatewayConfig) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
            connections: TaskTracker::new(),
        }
    }
}
