//! guidant-mcp: MCP server for desktop screenshot and click automation
//!
//! This library lets AI assistants observe and act on a desktop through two
//! tools, `take_screenshot` and `click`, served over newline-delimited
//! JSON-RPC on stdio (or, alternatively, plain HTTP).
//!
//! # Architecture
//!
//! The actual screen capture and click simulation are performed by an
//! external automation executable. This crate provides:
//!
//! - **Protocol handling**: framing, routing, and a fixed error taxonomy
//! - **Tool catalog**: static descriptors for `tools/list`
//! - **Automation executor**: runs the executable and packages its results
//!
//! # Modules
//!
//! - [`automation`] — Executor and the external command backend
//! - [`config`] — Configuration loading and validation
//! - [`error`] — Error types
//! - [`http`] — Alternate HTTP transport
//! - [`mcp`] — MCP protocol implementation

pub mod automation;
pub mod config;
pub mod error;
pub mod http;
pub mod mcp;
