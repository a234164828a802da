//! hyperon-server entry point.
//!
//! Starts the Axum server with the WebSocket command endpoint and blocks
//! until Ctrl-C or SIGTERM.

use tracing_subscriber::EnvFilter;

use hyperon_server::app_state::AppState;
use hyperon_server::config::GatewayConfig;
use hyperon_server::dispatch::Dispatcher;
use hyperon_server::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = GatewayConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(addr = %config.listen_addr, "starting hyperon-server");

    let dispatcher = Dispatcher::builtin();
    tracing::info!(
        commands = ?dispatcher.commands().collect::<Vec<_>>(),
        "registered commands"
    );

    let (listener, addr) = server::bind(&config).await?;
    let state = AppState::new(dispatcher, config);
    tracing::info!(url = %format!("ws://{addr}"), "server listening");

    server::serve(listener, state, server::shutdown_signal()).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
