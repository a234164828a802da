//! Wire types: inbound command envelope and outbound response.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::dispatch::Params;
use crate::error::GatewayError;

/// Inbound command envelope.
///
/// ```json
/// { "command": "add_atom", "params": {}, "requestId": "1" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Envelope {
    /// Name of the command to run.
    pub command: String,
    /// Command parameters. Missing or `null` means empty.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub params: Option<Params>,
    /// Opaque client correlation token, echoed back unchanged.
    #[serde(rename = "requestId", default)]
    #[schema(value_type = Option<String>)]
    pub request_id: Option<Value>,
}

impl Envelope {
    /// Decodes an envelope from a raw text frame.
    ///
    /// On failure the error is paired with whatever `requestId` could be
    /// recovered from the partially valid input, so the caller can still
    /// correlate its error response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Decode`] if `text` is not JSON, is not an
    /// object, or lacks a string `command` field.
    pub fn decode(text: &str) -> Result<Self, (Option<Value>, GatewayError)> {
        let value: Value = serde_json::from_str(text).map_err(|err| (None, err.into()))?;
        let request_id = value
            .get("requestId")
            .filter(|id| !id.is_null())
            .cloned();
        serde_json::from_value(value).map_err(|err| (request_id, err.into()))
    }

    /// Returns the command parameters, empty if none were sent.
    #[must_use]
    pub fn params(&self) -> Params {
        self.params.clone().unwrap_or_default()
    }
}

/// Outbound response, one per inbound envelope.
///
/// Serializes with a `status` discriminator and an always-present
/// `requestId` (`null` when unknown):
///
/// ```json
/// { "status": "success", "data": { "result": "Atom added" }, "requestId": "1" }
/// { "status": "error", "message": "Unknown command: bogus", "requestId": "2" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    /// The command ran and produced `data`.
    Success {
        /// Handler result.
        #[schema(value_type = Object)]
        data: Value,
        /// Echoed correlation token.
        #[serde(rename = "requestId")]
        #[schema(value_type = Option<String>)]
        request_id: Option<Value>,
    },
    /// The envelope could not be decoded or the command failed.
    Error {
        /// Failure description.
        message: String,
        /// Echoed correlation token.
        #[serde(rename = "requestId")]
        #[schema(value_type = Option<String>)]
        request_id: Option<Value>,
    },
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub const fn success(request_id: Option<Value>, data: Value) -> Self {
        Self::Success { data, request_id }
    }

    /// Builds an error response carrying the error's display text.
    #[must_use]
    pub fn error(request_id: Option<Value>, err: &GatewayError) -> Self {
        Self::Error {
            message: err.to_string(),
            request_id,
        }
    }
}
