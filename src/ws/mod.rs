//! WebSocket layer: upgrade handler, connection loop, wire types.
//!
//! The command endpoint is mounted at `/` and `/ws`. Every text frame a
//! client sends is one command envelope and gets exactly one response.

pub mod connection;
pub mod connection_id;
pub mod handler;
pub mod messages;

pub use messages::{Envelope, Response};
