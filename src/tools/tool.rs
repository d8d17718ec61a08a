//! Tool trait definition
//!
//! All tools implement this trait to provide a consistent interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::ToolDefinition;

/// Result of executing a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The output of the tool
    pub output: String,
    /// Whether the tool execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }
}

/// Trait for tools that the agent can use
///
/// `execute` returns `Ok(ToolResult::error(..))` for problems the model can
/// fix itself (bad arguments) and `Err` when a collaborator behind the tool
/// failed and the turn cannot continue.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of this tool
    fn name(&self) -> &str;

    /// Get a description of this tool
    fn description(&self) -> &str;

    /// Get the tool definition advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given input
    ///
    /// The input is a JSON value that should match the tool's input schema.
    async fn execute(&self, input: &Value) -> Result<ToolResult>;
}

/// Deserialize tool arguments into their typed form
///
/// On failure the error is phrased for the model, so it can be returned as an
/// error tool result.
pub fn parse_input<T: DeserializeOwned>(tool_name: &str, input: &Value) -> Result<T, ToolResult> {
    serde_json::from_value(input.clone())
        .map_err(|e| ToolResult::error(format!("Invalid input for {}: {}", tool_name, e)))
}
