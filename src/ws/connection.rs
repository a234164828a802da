//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection. Frames
//! are processed strictly in order: each one is decoded, dispatched and
//! answered (including the send) before the next frame is read. Decode
//! and dispatch failures are answered with an error response and never
//! end the connection; only transport failures, idleness and server
//! shutdown do, and those send a Close frame first where the socket
//! still allows it.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseCode, CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::connection_id::ConnectionId;
use super::messages::{Envelope, Response};
use crate::config::GatewayConfig;
use crate::dispatch::Dispatcher;
use crate::error::GatewayError;

/// Per-connection timeouts.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Close the connection after this long without an inbound frame.
    pub idle_timeout: Option<Duration>,
    /// Maximum time to flush one response frame.
    pub send_timeout: Duration,
}

impl From<&GatewayConfig> for ConnectionSettings {
    fn from(config: &GatewayConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout,
            send_timeout: config.send_timeout,
        }
    }
}

/// What ended a wait for the next inbound frame.
enum Inbound {
    Frame(Option<Result<Message, axum::Error>>),
    Idle,
    Shutdown,
}

/// Runs the read/write loop for a single WebSocket connection until the
/// client closes it, it goes idle, a send fails, or `shutdown` fires.
pub async fn run_connection(
    socket: WebSocket,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
    shutdown: CancellationToken,
) {
    let conn_id = ConnectionId::new();
    let span = tracing::info_span!("ws_connection", %conn_id);
    let (ws_tx, ws_rx) = socket.split();
    serve_frames(ws_tx, ws_rx, &dispatcher, settings, &shutdown)
        .instrument(span)
        .await;
}

async fn serve_frames<Tx, Rx>(
    mut ws_tx: Tx,
    mut ws_rx: Rx,
    dispatcher: &Dispatcher,
    settings: ConnectionSettings,
    shutdown: &CancellationToken,
) where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    tracing::info!("ws client connected");
    let mut handled: u64 = 0;

    loop {
        let frame = match next_inbound(&mut ws_rx, settings.idle_timeout, shutdown).await {
            Inbound::Frame(frame) => frame,
            Inbound::Idle => {
                tracing::info!("ws client idle, closing");
                send_close(&mut ws_tx, close_code::NORMAL, "idle timeout", &settings).await;
                break;
            }
            Inbound::Shutdown => {
                tracing::info!("server shutting down, closing ws connection");
                send_close(&mut ws_tx, close_code::AWAY, "server shutting down", &settings).await;
                break;
            }
        };

        let response = match frame {
            Some(Ok(Message::Text(text))) => handle_text_message(text.as_str(), dispatcher),
            Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                Ok(text) => handle_text_message(text, dispatcher),
                Err(err) => {
                    let err = GatewayError::Decode(err.to_string());
                    tracing::warn!(error = %err, "rejected binary frame");
                    Response::error(None, &err)
                }
            },
            // Pongs are answered by the WebSocket layer.
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
            Some(Ok(Message::Close(_))) | None => break,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ws receive failed");
                let (code, reason) = receive_error_close(&err);
                send_close(&mut ws_tx, code, reason, &settings).await;
                break;
            }
        };

        if let Err(err) = send_response(&mut ws_tx, &response, settings.send_timeout).await {
            tracing::warn!(error = %err, "ws send failed, closing connection");
            break;
        }
        handled += 1;
    }

    tracing::info!(handled, "ws connection closed");
}

/// Waits for the next inbound frame, the idle deadline, or shutdown,
/// whichever comes first. Shutdown wins ties.
async fn next_inbound<Rx>(
    ws_rx: &mut Rx,
    idle_timeout: Option<Duration>,
    shutdown: &CancellationToken,
) -> Inbound
where
    Rx: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let recv = async {
        match idle_timeout {
            Some(limit) => tokio::time::timeout(limit, ws_rx.next())
                .await
                .map_or(Inbound::Idle, Inbound::Frame),
            None => Inbound::Frame(ws_rx.next().await),
        }
    };

    tokio::select! {
        biased;
        () = shutdown.cancelled() => Inbound::Shutdown,
        inbound = recv => inbound,
    }
}

/// Picks the close code for a failed read.
///
/// The underlying tungstenite error is type-erased behind [`axum::Error`],
/// so an oversized message is recognised by its message text.
fn receive_error_close(err: &axum::Error) -> (CloseCode, &'static str) {
    if err.to_string().contains("Space limit exceeded") {
        (close_code::SIZE, "message too big")
    } else {
        (close_code::PROTOCOL, "protocol error")
    }
}

/// Sends a Close frame, best effort: failures are logged and ignored
/// because the connection is being torn down anyway.
async fn send_close<Tx>(
    ws_tx: &mut Tx,
    code: CloseCode,
    reason: &'static str,
    settings: &ConnectionSettings,
) where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
{
    let frame = CloseFrame {
        code,
        reason: Utf8Bytes::from_static(reason),
    };
    match tokio::time::timeout(settings.send_timeout, ws_tx.send(Message::Close(Some(frame))))
        .await
    {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::debug!(error = %err, "close frame not delivered"),
        Err(_) => tracing::debug!("close frame timed out"),
    }
}

/// Serializes `response` and flushes it as one text frame.
async fn send_response<Tx>(
    ws_tx: &mut Tx,
    response: &Response,
    limit: Duration,
) -> Result<(), GatewayError>
where
    Tx: Sink<Message, Error = axum::Error> + Unpin,
{
    let json =
        serde_json::to_string(response).map_err(|err| GatewayError::Internal(err.to_string()))?;
    tokio::time::timeout(limit, ws_tx.send(Message::text(json)))
        .await
        .map_err(|_| GatewayError::Transport(format!("send timed out after {limit:?}")))??;
    Ok(())
}

/// Handles one text frame, always producing exactly one [`Response`].
///
/// Malformed input yields an error response carrying whatever
/// `requestId` could be recovered.
pub fn handle_text_message(text: &str, dispatcher: &Dispatcher) -> Response {
    let envelope = match Envelope::decode(text) {
        Ok(envelope) => envelope,
        Err((request_id, err)) => {
            tracing::warn!(error = %err, "rejected malformed envelope");
            return Response::error(request_id, &err);
        }
    };

    tracing::debug!(command = %envelope.command, "dispatching command");
    match dispatcher.dispatch(&envelope.command, &envelope.params()) {
        Ok(data) => Response::success(envelope.request_id, data),
        Err(err) => {
            tracing::debug!(error = %err, "command failed");
            Response::error(envelope.request_id, &err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures_util::stream;

    use super::*;
    use serde_json::json;

    /// Sink whose writes never complete.
    struct StalledSink;

    impl Sink<Message> for StalledSink {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _item: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            idle_timeout: None,
            send_timeout: Duration::from_millis(50),
        }
    }

    fn handle(text: &str) -> serde_json::Value {
        let response = handle_text_message(text, &Dispatcher::builtin());
        serde_json::to_value(response).unwrap_or_default()
    }

    #[test]
    fn add_atom_scenario() {
        let out = handle(r#"{"command":"add_atom","params":{},"requestId":"1"}"#);
        assert_eq!(
            out,
            json!({ "status": "success", "data": { "result": "Atom added" }, "requestId": "1" })
        );
    }

    #[test]
    fn unknown_command_scenario() {
        let out = handle(r#"{"command":"bogus","requestId":"2"}"#);
        assert_eq!(
            out,
            json!({ "status": "error", "message": "Unknown command: bogus", "requestId": "2" })
        );
    }

    #[test]
    fn missing_request_id_is_null() {
        let out = handle(r#"{"command":"query"}"#);
        assert_eq!(out["status"], "success");
        assert_eq!(out["requestId"], serde_json::Value::Null);
    }

    #[test]
    fn malformed_json_yields_error_response() {
        let out = handle("not json at all");
        assert_eq!(out["status"], "error");
        assert_eq!(out["requestId"], serde_json::Value::Null);
        assert!(out["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[test]
    fn missing_command_echoes_request_id() {
        let out = handle(r#"{"params":{},"requestId":"abc"}"#);
        assert_eq!(out["status"], "error");
        assert_eq!(out["requestId"], "abc");
    }

    #[test]
    fn repeated_query_is_idempotent() {
        let text = r#"{"command":"query","params":{"q":"(a b)"},"requestId":"q1"}"#;
        assert_eq!(handle(text), handle(text));
    }

    #[test]
    fn non_string_request_id_is_echoed_verbatim() {
        let out = handle(r#"{"command":"get_atom","requestId":42}"#);
        assert_eq!(out["requestId"], 42);
    }

    #[test]
    fn settings_follow_config() {
        let config = GatewayConfig {
            idle_timeout: Some(Duration::from_secs(30)),
            ..GatewayConfig::default()
        };
        let settings = ConnectionSettings::from(&config);
        assert_eq!(settings.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.send_timeout, config.send_timeout);
    }

    #[tokio::test]
    async fn send_times_out_on_stalled_sink() {
        let response = Response::success(None, json!({ "result": "Query processed" }));
        let result = send_response(&mut StalledSink, &response, Duration::from_millis(50)).await;
        let Err(err) = result else {
            panic!("expected send timeout");
        };
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[tokio::test]
    async fn stalled_send_ends_the_connection() {
        let frame = Message::text(r#"{"command":"query","requestId":"s"}"#);
        // The stream never ends, so only the failed send can stop the loop.
        let rx = stream::iter([Ok(frame)]).chain(stream::pending());

        let token = CancellationToken::new();
        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            serve_frames(StalledSink, rx, &Dispatcher::builtin(), settings(), &token),
        )
        .await;
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn shutdown_ends_an_open_connection() {
        let mut sent: Vec<Message> = Vec::new();
        let token = CancellationToken::new();
        token.cancel();

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            serve_frames(
                (&mut sent).sink_map_err(|never: Infallible| -> axum::Error { match never {} }),
                stream::pending(),
                &Dispatcher::builtin(),
                settings(),
                &token,
            ),
        )
        .await;
        assert!(finished.is_ok());

        let [Message::Close(Some(frame))] = sent.as_slice() else {
            panic!("expected a single close frame, got {sent:?}");
        };
        assert_eq!(frame.code, close_code::AWAY);
    }

    #[tokio::test]
    async fn binary_frame_with_invalid_utf8_gets_error_then_next_frame_succeeds() {
        let mut sent: Vec<Message> = Vec::new();
        let frames = [
            Ok(Message::binary(vec![0xff, 0xfe])),
            Ok(Message::text(r#"{"command":"get_atom","requestId":"ok"}"#)),
        ];
        let token = CancellationToken::new();

        serve_frames(
            (&mut sent).sink_map_err(|never: Infallible| -> axum::Error { match never {} }),
            stream::iter(frames),
            &Dispatcher::builtin(),
            settings(),
            &token,
        )
        .await;

        let replies: Vec<serde_json::Value> = sent
            .iter()
            .filter_map(|msg| match msg {
                Message::Text(text) => serde_json::from_str(text.as_str()).ok(),
                _ => None,
            })
            .collect();
        let [bad, good] = replies.as_slice() else {
            panic!("expected two replies, got {replies:?}");
        };
        assert_eq!(bad["status"], "error");
        assert_eq!(bad["requestId"], serde_json::Value::Null);
        assert_eq!(good["status"], "success");
        assert_eq!(good["requestId"], "ok");
    }

    #[test]
    fn oversized_message_closes_with_size_code() {
        let err = axum::Error::new(std::io::Error::other(
            "Space limit exceeded: Message too long: 200 > 64",
        ));
        assert_eq!(receive_error_close(&err).0, close_code::SIZE);

        let other = axum::Error::new(std::io::Error::other("connection reset"));
        assert_eq!(receive_error_close(&other).0, close_code::PROTOCOL);
    }
}
