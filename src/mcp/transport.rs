//! Line-delimited transport for the MCP server.
//!
//! This module implements the stdio transport as specified by MCP:
//!
//! - Messages are UTF-8 encoded JSON-RPC
//! - Messages are delimited by newlines
//! - Messages must not contain embedded newlines
//! - stdin: receives messages from client
//! - stdout: sends messages to client
//! - stderr: may be used for logging (not MCP messages)
//!
//! [`LineTransport`] works over any async reader/writer pair so the message
//! loop can be driven from memory in tests; [`StdioTransport`] is the
//! instance used by the binary.

use std::io;
use std::string::FromUtf8Error;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::mcp::protocol::{JsonRpcError, JsonRpcResponse};

/// A newline-delimited JSON transport.
pub struct LineTransport<R, W> {
    /// Buffered input.
    reader: R,
    /// Output sink.
    writer: W,
}

/// One input line, or the decoding error if it was not UTF-8.
pub type Line = Result<String, FromUtf8Error>;

/// The transport over the process's stdin and stdout.
pub type StdioTransport = LineTransport<BufReader<tokio::io::Stdin>, tokio::io::Stdout>;

impl StdioTransport {
    /// Creates a new stdio transport.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::stdio()
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a transport over the given reader and writer.
    pub const fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Consumes the transport, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Reads the next message line.
    ///
    /// Returns `None` if the input is closed (EOF). A line that is not valid
    /// UTF-8 is returned as `Some(Err(_))` so the caller can answer it and
    /// keep reading.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails.
    pub async fn read_line(&mut self) -> io::Result<Option<Line>> {
        let mut buf = Vec::new();
        let bytes_read = self.reader.read_until(b'\n', &mut buf).await?;

        if bytes_read == 0 {
            // EOF - stdin closed
            return Ok(None);
        }

        // Remove the trailing newline
        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        Ok(Some(String::from_utf8(buf)))
    }

    /// Writes a JSON-RPC response.
    ///
    /// The response is serialised to JSON and terminated with a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_response(&mut self, response: &JsonRpcResponse) -> io::Result<()> {
        self.write_message(response).await
    }

    /// Writes a JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation or writing fails.
    pub async fn write_error(&mut self, error: &JsonRpcError) -> io::Result<()> {
        self.write_message(error).await
    }

    async fn write_message<T: Serialize + Sync>(&mut self, message: &T) -> io::Result<()> {
        let json = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        self.write_raw(&json).await
    }

    /// Writes a raw JSON string with newline termination, then flushes.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    async fn write_raw(&mut self, json: &str) -> io::Result<()> {
        // MCP spec: messages must not contain embedded newlines
        debug_assert!(
            !json.contains('\n'),
            "JSON message must not contain embedded newlines"
        );

        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::protocol::RequestId;

    fn memory(input: &'static [u8]) -> LineTransport<&'static [u8], Vec<u8>> {
        LineTransport::new(input, Vec::new())
    }

    #[test]
    fn transport_default() {
        // Just ensure Default is implemented and doesn't panic
        let _transport = StdioTransport::default();
    }

    #[tokio::test]
    async fn read_lines_until_eof() {
        let mut transport = memory(b"first\r\nsecond\nlast");
        assert_eq!(transport.read_line().await.unwrap().unwrap().unwrap(), "first");
        assert_eq!(transport.read_line().await.unwrap().unwrap().unwrap(), "second");
        assert_eq!(transport.read_line().await.unwrap().unwrap().unwrap(), "last");
        assert!(transport.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_fail_the_read() {
        let mut transport = memory(b"\xff\xfe\r\nnext\n");
        let bad = transport.read_line().await.unwrap().unwrap();
        assert_eq!(bad.unwrap_err().into_bytes(), vec![0xff, 0xfe]);
        assert_eq!(transport.read_line().await.unwrap().unwrap().unwrap(), "next");
    }

    #[tokio::test]
    async fn write_is_newline_terminated() {
        let mut transport = memory(b"");
        let response = JsonRpcResponse::success(RequestId::from(1), serde_json::json!({}));
        transport.write_response(&response).await.unwrap();
        transport.write_error(&JsonRpcError::parse_error()).await.unwrap();

        let written = String::from_utf8(transport.into_writer()).unwrap();
        let lines: Vec<_> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(written.ends_with('\n'));
        assert_eq!(lines[0], r#"{"jsonrpc":"2.0","id":1,"result":{}}"#);
    }

    #[tokio::test]
    async fn serialise_response_no_newlines() {
        // Verify our JSON serialisation doesn't produce embedded newlines
        let response = JsonRpcResponse::success(
            RequestId::from(1),
            serde_json::json!({
                "message": "hello\nworld",
                "nested": {"key": "value"}
            }),
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(
            !json.contains('\n'),
            "Serialised JSON should not contain newlines"
        );
    }
}
