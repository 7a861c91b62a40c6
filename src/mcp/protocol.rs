//! JSON-RPC 2.0 message types for MCP protocol.
//!
//! This module defines the envelope types exchanged over the line transport.
//!
//! # Message Types
//!
//! - **Request**: `{"id", "method", "params"}`; `id` may be a string, a
//!   number, or `null`, and may be absent for notifications
//! - **Response**: `{"jsonrpc", "id", "result"}` on success
//! - **Error**: `{"jsonrpc", "id", "error": {"code", "message", "data"?}}`
//!
//! Incoming messages are accepted without a `jsonrpc` member. Every outgoing
//! message carries `"jsonrpc": "2.0"` and an `id`, which is `null` when the
//! request's id could not be determined.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::BridgeError;

/// The MCP protocol version this implementation supports.
pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";

/// Server name for capability negotiation.
pub const SERVER_NAME: &str = "guidant-mcp";

/// JSON-RPC version tag written on every outgoing message.
pub const JSONRPC_VERSION: &str = "2.0";

/// A JSON-RPC 2.0 request ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric request ID.
    Number(Number),
    /// String request ID.
    String(String),
    /// Explicit or implied `null`.
    Null,
}

impl From<i64> for RequestId {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// An incoming request or notification.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// Request identifier, `None` when the member was absent.
    pub id: Option<RequestId>,

    /// The method to invoke.
    pub method: String,

    /// Parameters for the method; an empty object when absent.
    pub params: Value,
}

impl JsonRpcRequest {
    /// Returns the id to echo in the response.
    #[must_use]
    pub fn response_id(&self) -> RequestId {
        self.id.clone().unwrap_or(RequestId::Null)
    }

    /// Extracts a request from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns an internal error response if the value is not an object,
    /// `id` has an unsupported type, or `method` is missing or not a string.
    pub fn from_value(value: Value) -> Result<Self, JsonRpcError> {
        let Value::Object(mut obj) = value else {
            return Err(JsonRpcError::from_bridge(
                RequestId::Null,
                &BridgeError::InvalidEnvelope("message must be a JSON object"),
            ));
        };

        let id = match obj.remove("id") {
            None => None,
            Some(raw) => Some(serde_json::from_value::<RequestId>(raw).map_err(|_| {
                JsonRpcError::from_bridge(
                    RequestId::Null,
                    &BridgeError::InvalidEnvelope("id must be a string, number, or null"),
                )
            })?),
        };

        let Some(Value::String(method)) = obj.remove("method") else {
            return Err(JsonRpcError::from_bridge(
                id.unwrap_or(RequestId::Null),
                &BridgeError::InvalidEnvelope("method must be a string"),
            ));
        };

        let params = match obj.remove("params") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(params) => params,
        };

        Ok(Self { id, method, params })
    }
}

/// A successful JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcResponse {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this response corresponds to.
    pub id: RequestId,

    /// The result of the method call.
    pub result: Value,
}

impl JsonRpcResponse {
    /// Creates a new success response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Value is not const-compatible
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
        }
    }
}

/// The error codes this server emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Invalid JSON was received by the server.
    ParseError,
    /// An expected failure: bad arguments, unknown method or tool, or a
    /// failed automation command.
    DomainError,
    /// Any other fault.
    InternalError,
}

impl ErrorCode {
    /// Returns the numeric code for this error.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::ParseError => -32700,
            Self::DomainError => -32000,
            Self::InternalError => -32603,
        }
    }

    /// Returns the default message for this error code.
    #[must_use]
    pub const fn default_message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::DomainError => "Server error",
            Self::InternalError => "Internal error",
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcErrorData {
    /// The error code.
    pub code: i32,

    /// A short description of the error.
    pub message: String,

    /// Additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcErrorData {
    /// Creates a new error from an error code.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.default_message().to_string(),
            data: None,
        }
    }

    /// Creates a new error with a custom message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    /// Adds additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

impl From<&BridgeError> for JsonRpcErrorData {
    fn from(err: &BridgeError) -> Self {
        let data = Self::with_message(err.code(), err.message());
        match err.data() {
            Some(extra) => data.with_data(extra),
            None => data,
        }
    }
}

/// A JSON-RPC 2.0 error response.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Always "2.0".
    pub jsonrpc: &'static str,

    /// The request ID this error corresponds to, `null` if unknown.
    pub id: RequestId,

    /// The error details.
    pub error: JsonRpcErrorData,
}

impl JsonRpcError {
    /// Creates a new error response.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // JsonRpcErrorData contains String
    pub fn new(id: RequestId, error: JsonRpcErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            error,
        }
    }

    /// Creates a parse error response (ID cannot be determined).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(
            RequestId::Null,
            JsonRpcErrorData::from_code(ErrorCode::ParseError),
        )
    }

    /// Creates an error response describing `err`.
    #[must_use]
    pub fn from_bridge(id: RequestId, err: &BridgeError) -> Self {
        Self::new(id, JsonRpcErrorData::from(err))
    }
}

/// Parses one input line into a request.
///
/// # Errors
///
/// Returns a parse error response if the line is not JSON, or an internal
/// error response if it is JSON but not a usable request envelope.
pub fn parse_message(json: &str) -> Result<JsonRpcRequest, JsonRpcError> {
    let value: Value = serde_json::from_str(json).map_err(|_| JsonRpcError::parse_error())?;
    JsonRpcRequest::from_value(value)
}
