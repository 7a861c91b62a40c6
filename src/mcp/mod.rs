//! Model Context Protocol (MCP) server implementation.
//!
//! This module exposes the desktop automation operations as MCP tools. The
//! server communicates over stdio transport using newline-delimited
//! JSON-RPC 2.0 messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          MCP Server                          │
//! │                                                              │
//! │   ┌─────────────┐    ┌─────────────┐    ┌──────────────┐     │
//! │   │  Transport  │───▶│   Router    │───▶│  Automation  │     │
//! │   │   (stdio)   │    │  (methods)  │    │  (executor)  │     │
//! │   └─────────────┘    └─────────────┘    └──────────────┘     │
//! │          │                  │                  │             │
//! │          ▼                  ▼                  ▼             │
//! │   ┌────────────────────────────────────────────────────┐     │
//! │   │       JSON-RPC Messages / Error Normalisation      │     │
//! │   └────────────────────────────────────────────────────┘     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol Version
//!
//! This implementation targets MCP protocol version 2024-11-05.

pub mod protocol;
pub mod router;
pub mod server;
pub mod tools;
pub mod transport;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, MCP_PROTOCOL_VERSION};
pub use router::{Dispatch, Method, Router};
pub use server::{handle_line, McpServer, Outgoing};
pub use transport::{Line, LineTransport, StdioTransport};
