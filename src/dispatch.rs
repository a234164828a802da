//! Command dispatcher: maps command names to handler functions.
//!
//! The dispatcher is a read-only table built once at startup and shared
//! across connections behind an `Arc`. Handlers are plain functions with
//! no access to connection state, so dispatch needs no locking.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};

use crate::error::GatewayError;

/// Command parameters as sent in the envelope's `params` object.
pub type Params = Map<String, Value>;

/// Signature of a command handler.
pub type HandlerFn = fn(&Params) -> Result<Value, GatewayError>;

/// Table of named command handlers.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    handlers: BTreeMap<String, HandlerFn>,
}

impl Dispatcher {
    /// Creates an empty dispatcher with no commands registered.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with the built-in atomspace commands:
    /// `query`, `add_atom` and `get_atom`.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new()
            .register("query", query)
            .register("add_atom", add_atom)
            .register("get_atom", get_atom)
    }

    /// Registers `handler` under `name`, replacing any previous handler
    /// with the same name.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, handler: HandlerFn) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Returns the registered command names in sorted order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Runs the handler registered for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownCommand`] if no handler is registered
    /// under `command`, or whatever error the handler itself returns.
    pub fn dispatch(&self, command: &str, params: &Params) -> Result<Value, GatewayError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| GatewayError::UnknownCommand(command.to_string()))?;
        handler(params)
    }
}

// Placeholders until an atomspace backend exists: params are ignored.

fn query(_params: &Params) -> Result<Value, GatewayError> {
    Ok(json!({ "result": "Query processed" }))
}

fn add_atom(_params: &Params) -> Result<Value, GatewayError> {
    Ok(json!({ "result": "Atom added" }))
}

fn get_atom(_params: &Params) -> Result<Value, GatewayError> {
    Ok(json!({ "result": "Atom retrieved" }))
}
