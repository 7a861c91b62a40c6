//! Error types for guidant-mcp.
//!
//! Two families live here:
//!
//! - [`ConfigError`] covers loading the configuration file at startup.
//! - [`BridgeError`] covers everything that can go wrong while serving a
//!   single request. Every variant maps onto exactly one JSON-RPC error code
//!   (see [`BridgeError::code`]), so the message loop can turn any failure
//!   into a well-formed error response.

use std::path::PathBuf;

use serde_json::{json, Value};
use thiserror::Error;

use crate::automation::Operation;
use crate::mcp::protocol::ErrorCode;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Result type for request handling.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while handling a single request.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// A click was requested without both coordinates.
    #[error("x and y coordinates are required")]
    MissingCoordinates,

    /// A coordinate was present but not a number.
    #[error("x and y coordinates must be numbers")]
    InvalidCoordinates,

    /// `tools/call` was sent without a tool name.
    #[error("Tool name is required")]
    MissingToolName,

    /// The method is not part of the routing table.
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    /// `tools/call` named a tool that is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The automation executable is not installed or not on `PATH`.
    #[error("Automation executable not found: {program}")]
    ExecutableNotFound {
        /// Program that could not be launched.
        program: String,
    },

    /// The automation executable exited with a non-zero status.
    #[error("{}", .operation.failure_message())]
    CommandFailed {
        /// Operation that was being performed.
        operation: Operation,
        /// Captured standard error of the command.
        stderr: String,
    },

    /// The automation executable did not finish within the configured limit.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Operation that was being performed.
        operation: Operation,
        /// Configured limit in seconds.
        seconds: u64,
    },

    /// The automation executable could not be started for a reason other
    /// than it being absent.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The screenshot was taken but the image file could not be read back.
    #[error("failed to read screenshot {}: {source}", .path.display())]
    ImageRead {
        /// Path of the image file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The message parsed as JSON but is not a usable request envelope.
    #[error("invalid request: {0}")]
    InvalidEnvelope(&'static str),

    /// A result could not be serialised.
    #[error("failed to serialise result: {0}")]
    Serialise(#[from] serde_json::Error),
}

impl BridgeError {
    /// Returns the JSON-RPC error code this failure is reported under.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCoordinates
            | Self::InvalidCoordinates
            | Self::MissingToolName
            | Self::UnknownMethod(_)
            | Self::UnknownTool(_)
            | Self::ExecutableNotFound { .. }
            | Self::CommandFailed { .. }
            | Self::Timeout { .. } => ErrorCode::DomainError,
            Self::Spawn { .. }
            | Self::ImageRead { .. }
            | Self::InvalidEnvelope(_)
            | Self::Serialise(_) => ErrorCode::InternalError,
        }
    }

    /// Returns the message placed in the error object.
    ///
    /// Internal errors are prefixed so clients can tell them apart from
    /// expected failures.
    #[must_use]
    pub fn message(&self) -> String {
        match self.code() {
            ErrorCode::InternalError => format!("Internal error: {self}"),
            _ => self.to_string(),
        }
    }

    /// Returns the optional `data` member of the error object.
    #[must_use]
    pub fn data(&self) -> Option<Value> {
        match self {
            Self::CommandFailed { stderr, .. } => Some(json!({ "details": stderr })),
            _ => None,
        }
    }
}
