//! Method routing.
//!
//! Maps a method name onto a handler and produces either a result value or
//! a signal that no response should be written. The routing table:
//!
//! | method                                     | handler                               |
//! |--------------------------------------------|---------------------------------------|
//! | `initialize`                               | server identity and capabilities      |
//! | `initialized`, `notifications/initialized` | nothing, no response                  |
//! | `ping`                                     | empty object                          |
//! | `tools/list`                               | the tool catalog                      |
//! | `tools/call`                               | runs a tool, wraps the outcome as MCP text content |
//! | `screenshot`, `click`                      | legacy direct calls, raw outcome      |
//!
//! Any other method is an [`BridgeError::UnknownMethod`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::automation::{Automation, Operation, OperationOutcome};
use crate::error::{BridgeError, BridgeResult};
use crate::mcp::protocol::{MCP_PROTOCOL_VERSION, SERVER_NAME};
use crate::mcp::tools::{self, Tool};

/// A method this server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `initialize`
    Initialize,
    /// `initialized` / `notifications/initialized`
    Initialized,
    /// `ping`
    Ping,
    /// `tools/list`
    ToolsList,
    /// `tools/call`
    ToolsCall,
    /// Legacy `screenshot`
    Screenshot,
    /// Legacy `click`
    Click,
}

impl Method {
    /// Looks a method up by its wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Self::Initialize,
            "initialized" | "notifications/initialized" => Self::Initialized,
            "ping" => Self::Ping,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            "screenshot" => Self::Screenshot,
            "click" => Self::Click,
            _ => return None,
        };
        Some(method)
    }
}

/// What the message loop should do after routing a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Write a success response carrying this result.
    Reply(Value),
    /// Write nothing.
    NoReply,
}

/// Server capabilities advertised during initialisation.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCapabilities {
    /// Tool-related capabilities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolCapabilities>,
}

impl Default for ServerCapabilities {
    fn default() -> Self {
        Self {
            tools: Some(ToolCapabilities::default()),
        }
    }
}

/// Tool-specific capabilities.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change during the session.
    #[serde(rename = "listChanged", skip_serializing_if = "is_false")]
    pub list_changed: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)] // serde's skip_serializing_if requires a predicate fn(&T) -> bool, so we must take &bool here
const fn is_false(b: &bool) -> bool {
    !*b
}

/// Server information for initialisation response.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: SERVER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Client information optionally sent with `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    #[serde(default)]
    pub version: Option<String>,
}

/// Content item in a tool call response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Content returned by the tool.
    pub content: Vec<ToolContent>,
}

impl ToolCallResult {
    /// Creates a text result.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// Wraps an operation outcome as JSON text content.
    ///
    /// # Errors
    ///
    /// Returns an error if the outcome cannot be serialised.
    pub fn from_outcome(outcome: &OperationOutcome) -> BridgeResult<Self> {
        Ok(Self::text(serde_json::to_string(outcome)?))
    }
}

/// Routes requests to their handlers.
#[derive(Debug, Clone)]
pub struct Router {
    automation: Automation,
}

impl Router {
    /// Creates a router that runs tools through `automation`.
    #[must_use]
    pub const fn new(automation: Automation) -> Self {
        Self { automation }
    }

    /// Handles one request.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown methods or tools, invalid arguments, and
    /// any failure raised by the automation executor.
    pub async fn dispatch(&self, method: &str, params: &Value) -> BridgeResult<Dispatch> {
        let Some(route) = Method::from_name(method) else {
            return Err(BridgeError::UnknownMethod(method.to_string()));
        };

        tracing::debug!(method, ?route, "Dispatching request");

        let result = match route {
            Method::Initialize => Self::initialize(params),
            Method::Initialized => {
                tracing::info!("Client initialised");
                return Ok(Dispatch::NoReply);
            }
            Method::Ping => json!({}),
            Method::ToolsList => json!({ "tools": tools::catalog() }),
            Method::ToolsCall => self.call_tool(params).await?,
            Method::Screenshot => self.legacy(Operation::Screenshot, params).await?,
            Method::Click => self.legacy(Operation::Click, params).await?,
        };

        Ok(Dispatch::Reply(result))
    }

    fn initialize(params: &Value) -> Value {
        if let Some(client) = params
            .get("clientInfo")
            .and_then(|v| ClientInfo::deserialize(v).ok())
        {
            tracing::info!(
                client = %client.name,
                version = client.version.as_deref().unwrap_or("unknown"),
                "Initialize request received"
            );
        }

        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default(),
        })
    }

    async fn call_tool(&self, params: &Value) -> BridgeResult<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or(BridgeError::MissingToolName)?;
        let tool = Tool::from_name(name).ok_or_else(|| BridgeError::UnknownTool(name.to_string()))?;

        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(arguments) => arguments.clone(),
        };

        tracing::info!(tool = tool.name(), "Tool call");

        let outcome = self.automation.run(tool.operation(), &arguments).await?;
        Ok(serde_json::to_value(ToolCallResult::from_outcome(&outcome)?)?)
    }

    async fn legacy(&self, operation: Operation, params: &Value) -> BridgeResult<Value> {
        let outcome = self.automation.run(operation, params).await?;
        Ok(serde_json::to_value(outcome)?)
    }
}
