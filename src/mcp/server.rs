//! MCP server message loop.
//!
//! The loop reads one line at a time, dispatches it through the [`Router`],
//! and writes at most one line back before reading the next:
//!
//! 1. **Parse**: invalid JSON yields a parse error with `id: null`
//! 2. **Dispatch**: the router returns a result, nothing (notifications), or
//!    a [`BridgeError`]
//! 3. **Normalise**: every error becomes a JSON-RPC error object with the
//!    request's id
//! 4. **Write**: one JSON line, flushed immediately
//!
//! The loop ends when input reaches EOF or on SIGINT/SIGTERM. A failing
//! request never ends the loop.

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::mcp::protocol::{parse_message, JsonRpcError, JsonRpcResponse};
use crate::mcp::router::{Dispatch, Router};
use crate::mcp::transport::{Line, LineTransport, StdioTransport};

/// A message the server writes back for one input line.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    /// Success response.
    Response(JsonRpcResponse),
    /// Error response.
    Error(JsonRpcError),
}

impl Outgoing {
    /// Returns `true` for an error response.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Produces the reply for one input line, or `None` if nothing is written.
///
/// Never fails: every error is turned into an error response.
pub async fn handle_line(router: &Router, line: &str) -> Option<Outgoing> {
    let request = match parse_message(line) {
        Ok(request) => request,
        Err(error) => {
            tracing::warn!(code = error.error.code, "Rejected malformed message");
            return Some(Outgoing::Error(error));
        }
    };

    let id = request.response_id();

    match router.dispatch(&request.method, &request.params).await {
        Ok(Dispatch::Reply(result)) => Some(Outgoing::Response(JsonRpcResponse::success(id, result))),
        Ok(Dispatch::NoReply) => None,
        Err(err) => {
            tracing::warn!(
                method = %request.method,
                %id,
                code = err.code().code(),
                error = %err,
                "Request failed"
            );
            Some(Outgoing::Error(JsonRpcError::from_bridge(id, &err)))
        }
    }
}

/// The MCP server.
pub struct McpServer<R = tokio::io::BufReader<tokio::io::Stdin>, W = tokio::io::Stdout> {
    /// Request router.
    router: Router,
    /// The transport layer.
    transport: LineTransport<R, W>,
}

impl McpServer {
    /// Creates a server on stdin/stdout.
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self::with_transport(router, StdioTransport::stdio())
    }
}

impl<R, W> McpServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a server on an arbitrary transport.
    pub const fn with_transport(router: Router, transport: LineTransport<R, W>) -> Self {
        Self { router, transport }
    }

    /// Consumes the server, returning its transport.
    pub fn into_transport(self) -> LineTransport<R, W> {
        self.transport
    }

    /// Runs the message loop with graceful shutdown handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn run(&mut self) -> std::io::Result<()> {
        self.run_with_shutdown().await
    }

    /// Runs the message loop until EOF, without signal handling.
    ///
    /// # Errors
    ///
    /// Returns an error if transport I/O fails.
    pub async fn serve(&mut self) -> std::io::Result<()> {
        loop {
            let line_result = self.transport.read_line().await;
            if self.handle_transport_result(line_result).await? {
                return Ok(());
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(unix)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt()).map_err(std::io::Error::other)?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(std::io::Error::other)?;

        loop {
            tokio::select! {
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                    return Ok(());
                }

                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Runs the main loop and handles shutdown.
    #[cfg(windows)]
    async fn run_with_shutdown(&mut self) -> std::io::Result<()> {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                    return Ok(());
                }

                line_result = self.transport.read_line() => {
                    if self.handle_transport_result(line_result).await? {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Handles the result from transport read.
    ///
    /// Returns `true` if the server should shut down.
    async fn handle_transport_result(
        &mut self,
        line_result: std::io::Result<Option<Line>>,
    ) -> std::io::Result<bool> {
        let Some(line) = line_result? else {
            tracing::info!("Input closed");
            return Ok(true);
        };

        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected line that is not UTF-8");
                self.transport.write_error(&JsonRpcError::parse_error()).await?;
                return Ok(false);
            }
        };

        if line.trim().is_empty() {
            return Ok(false);
        }

        match handle_line(&self.router, &line).await {
            Some(Outgoing::Response(response)) => self.transport.write_response(&response).await?,
            Some(Outgoing::Error(error)) => self.transport.write_error(&error).await?,
            None => {}
        }

        Ok(false)
    }
}
