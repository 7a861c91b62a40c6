//! The tool catalog served by `tools/list`.
//!
//! The catalog is built once on first use and never changes afterwards.

use std::sync::OnceLock;

use serde::Serialize;
use serde_json::{json, Value};

use crate::automation::Operation;

/// A tool exposed through `tools/call`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// `take_screenshot`
    TakeScreenshot,
    /// `click`
    Click,
}

impl Tool {
    /// Every tool, in catalog order.
    pub const ALL: [Self; 2] = [Self::TakeScreenshot, Self::Click];

    /// Looks a tool up by its catalog name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    /// The name clients call this tool by.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TakeScreenshot => "take_screenshot",
            Self::Click => "click",
        }
    }

    /// The automation operation backing this tool.
    #[must_use]
    pub const fn operation(self) -> Operation {
        match self {
            Self::TakeScreenshot => Operation::Screenshot,
            Self::Click => Operation::Click,
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::TakeScreenshot => {
                "Capture the main display. Returns the saved file path and the PNG \
                 image encoded as base64."
            }
            Self::Click => {
                "Simulate a left mouse click at the given screen coordinates \
                 (in points, origin at the top-left of the main display)."
            }
        }
    }

    fn input_schema(self) -> Value {
        match self {
            Self::TakeScreenshot => json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            Self::Click => json!({
                "type": "object",
                "properties": {
                    "x": {
                        "type": "number",
                        "description": "Horizontal screen coordinate"
                    },
                    "y": {
                        "type": "number",
                        "description": "Vertical screen coordinate"
                    }
                },
                "required": ["x", "y"]
            }),
        }
    }

    fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }
}

/// A tool definition for the `tools/list` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Unique tool name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// JSON Schema for the tool's input parameters.
    pub input_schema: Value,
}

/// Returns the tool catalog.
#[must_use]
pub fn catalog() -> &'static [ToolDescriptor] {
    static CATALOG: OnceLock<Vec<ToolDescriptor>> = OnceLock::new();
    CATALOG.get_or_init(|| Tool::ALL.into_iter().map(Tool::descriptor).collect())
}
