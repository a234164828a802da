//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default, so the
//! server starts with no configuration at all.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default bind address for the command endpoint.
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8765";

/// Top-level server configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the server to (e.g. `127.0.0.1:8765`).
    pub listen_addr: SocketAddr,

    /// Close a connection after this long without an inbound frame.
    /// `None` disables the idle timeout.
    pub idle_timeout: Option<Duration>,

    /// Maximum time allowed to flush one outbound response frame.
    pub send_timeout: Duration,

    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_message_bytes: usize,

    /// Directory served in plain-HTTP mode.
    pub static_dir: PathBuf,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8765)),
            idle_timeout: None,
            send_timeout: Duration::from_secs(10),
            max_message_bytes: 1024 * 1024,
            static_dir: PathBuf::from("dist"),
            json_logs: false,
        }
    }
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// | Variable                | Default          |
    /// |-------------------------|------------------|
    /// | `LISTEN_ADDR`           | `127.0.0.1:8765` |
    /// | `WS_IDLE_TIMEOUT_SECS`  | `0` (disabled)   |
    /// | `WS_SEND_TIMEOUT_SECS`  | `10`             |
    /// | `WS_MAX_MESSAGE_BYTES`  | `1048576`        |
    /// | `STATIC_DIR`            | `dist`           |
    /// | `LOG_FORMAT`            | `text`           |
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string())
            .parse()?;

        let idle_timeout = match parse_env("WS_IDLE_TIMEOUT_SECS", 0_u64) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let send_timeout = Duration::from_secs(parse_env(
            "WS_SEND_TIMEOUT_SECS",
            defaults.send_timeout.as_secs(),
        ));
        let max_message_bytes = parse_env("WS_MAX_MESSAGE_BYTES", defaults.max_message_bytes);

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let json_logs = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Ok(Self {
            listen_addr,
            idle_timeout,
            send_timeout,
            max_message_bytes,
            static_dir,
            json_logs,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
