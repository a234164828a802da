//! # hyperon-server
//!
//! WebSocket command-dispatch server for Hyperon atomspace clients.
//!
//! Clients send JSON command envelopes over a WebSocket; each envelope is
//! routed to a named handler and answered with exactly one JSON response,
//! correlated by the client's `requestId`.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, HTTP)
//!     │
//!     ├── WS Handler + Connection loop (ws/)
//!     ├── HTTP command + health endpoints (api/)
//!     │
//!     └── Dispatcher (dispatch)
//! ```
//!
//! ## Wire format
//!
//! ```text
//! → {"command":"add_atom","params":{},"requestId":"1"}
//! ← {"status":"success","data":{"result":"Atom added"},"requestId":"1"}
//!
//! → {"command":"bogus","requestId":"2"}
//! ← {"status":"error","message":"Unknown command: bogus","requestId":"2"}
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod server;
pub mod ws;
