//! OpenAI chat-completions client
//!
//! Direct HTTP client for the OpenAI Chat Completions API, translating between
//! the internal message types (role + content blocks) and the OpenAI format.
//!
//! ```ignore
//! let llm = OpenAiProvider::new("sk-...")
//!     .with_model("gpt-4o-mini")
//!     .with_temperature(0.0);
//! ```

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::provider::LlmProvider;
use super::types::{
    ContentBlock, Message, MessageContent, MessageResponse, StopReason, ToolDefinition,
    Usage,
};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

// ============================================================================
// OpenAI-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAiToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAiMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAiToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: OpenAiFunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct OpenAiFunctionCall {
    name: String,
    /// JSON-encoded arguments, exactly as produced by the model
    arguments: String,
}

#[derive(Debug, Serialize)]
struct OpenAiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: OpenAiFunction,
}

#[derive(Debug, Serialize)]
struct OpenAiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    id: Option<String>,
    model: Option<String>,
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ============================================================================
// OpenAiProvider
// ============================================================================

/// OpenAI LLM provider
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    api_base: String,
}

impl OpenAiProvider {
    /// Create a new provider with a specific API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the API base URL (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api_base = base_url.into().trim_end_matches('/').to_string();
        self
    }

    // ========================================================================
    // Format conversion: Internal -> OpenAI
    // ========================================================================

    /// Convert the system prompt and internal messages to OpenAI messages
    fn convert_messages(system: Option<&str>, messages: &[Message]) -> Vec<OpenAiMessage> {
        let mut converted = Vec::with_capacity(messages.len() + 1);

        if let Some(system) = system {
            converted.push(OpenAiMessage::text("system", system));
        }

        for msg in messages {
            match &msg.content {
                MessageContent::Text(text) => {
                    converted.push(OpenAiMessage::text(&msg.role, text.clone()));
                }
                MessageContent::Blocks(blocks) if msg.is_user() => {
                    Self::convert_user_blocks(blocks, &mut converted);
                }
                MessageContent::Blocks(blocks) => {
                    converted.push(Self::convert_assistant_blocks(&msg.role, blocks));
                }
            }
        }

        converted
    }

    /// Tool results become one `tool` message each; text follows as a user message
    fn convert_user_blocks(blocks: &[ContentBlock], out: &mut Vec<OpenAiMessage>) {
        let mut text = String::new();

        for block in blocks {
            match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let content = if *is_error {
                        format!("Error: {}", content)
                    } else {
                        content.clone()
                    };
                    out.push(OpenAiMessage {
                        role: "tool".to_string(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: Some(tool_use_id.clone()),
                    });
                }
                ContentBlock::Text { text: t } => text.push_str(t),
                ContentBlock::ToolUse { .. } => {
                    tracing::warn!("[OpenAI] Skipping tool_use block in user message");
                }
            }
        }

        if !text.is_empty() {
            out.push(OpenAiMessage::text("user", text));
        }
    }

    fn convert_assistant_blocks(role: &str, blocks: &[ContentBlock]) -> OpenAiMessage {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in blocks {
            match block {
                ContentBlock::Text { text: t } => text.push_str(t),
                ContentBlock::ToolUse { id, name, input } => {
                    // Unparseable arguments are kept verbatim as a JSON string
                    let arguments = match input {
                        Value::String(raw) => raw.clone(),
                        other => other.to_string(),
                    };
                    tool_calls.push(OpenAiToolCall {
                        id: id.clone(),
                        call_type: "function".to_string(),
                        function: OpenAiFunctionCall {
                            name: name.clone(),
                            arguments,
                        },
                    });
                }
                ContentBlock::ToolResult { .. } => {
                    tracing::warn!("[OpenAI] Skipping tool_result block in assistant message");
                }
            }
        }

        OpenAiMessage {
            role: role.to_string(),
            content: if text.is_empty() { None } else { Some(text) },
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        }
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Option<Vec<OpenAiTool>> {
        if tools.is_empty() {
            return None;
        }

        Some(
            tools
                .iter()
                .map(|tool| OpenAiTool {
                    tool_type: "function",
                    function: OpenAiFunction {
                        name: tool.name.clone(),
                        description: tool.description.clone(),
                        parameters: tool.input_schema.to_json(),
                    },
                })
                .collect(),
        )
    }


    // ========================================================================
    // Format conversion: OpenAI -> Internal
    // ========================================================================

    fn convert_response(&self, response: OpenAiResponse) -> Result<MessageResponse> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .context("No choices in OpenAI response")?;

        let mut content = Vec::new();

        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::text(text));
        }

        for call in choice.message.tool_calls.unwrap_or_default() {
            let input = serde_json::from_str(&call.function.arguments)
                .unwrap_or(Value::String(call.function.arguments));
            content.push(ContentBlock::tool_use(call.id, call.function.name, input));
        }

        let has_tool_use = content
            .iter()
            .any(|b| matches!(b, ContentBlock::ToolUse { .. }));

        let stop_reason = if has_tool_use {
            Some(StopReason::ToolUse)
        } else {
            choice.finish_reason.as_deref().map(|r| match r {
                "length" => StopReason::MaxTokens,
                "tool_calls" | "function_call" => StopReason::ToolUse,
                "content_filter" => StopReason::Refusal,
                _ => StopReason::EndTurn,
            })
        };

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(MessageResponse {
            id: response
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            content,
            model: response.model.unwrap_or_else(|| self.model.clone()),
            stop_reason,
            usage,
        })
    }

    // ========================================================================
    // API methods
    // ========================================================================

    async fn send_openai_request(
        &self,
        request: &OpenAiRequest,
        session_id: Option<&str>,
    ) -> Result<OpenAiResponse> {
        let url = format!("{}/chat/completions", self.api_base);

        let mut request_builder = self.client.post(&url).bearer_auth(&self.api_key);

        // Add agent-session-id header if session_id is provided
        if let Some(sid) = session_id {
            request_builder = request_builder.header("agent-session-id", sid);
        }

        let response = request_builder
            .json(request)
            .send()
            .await
            .context("Failed to send request to OpenAI API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read OpenAI response body")?;

        tracing::debug!("[OpenAI] Response status: {}", status);
        tracing::trace!("[OpenAI] Response body: {}", response_text);

        if !status.is_success() {
            tracing::error!("[OpenAI] API error: {} - {}", status, response_text);
            anyhow::bail!("OpenAI API error ({}): {}", status, response_text);
        }

        serde_json::from_str(&response_text).context("Failed to parse OpenAI API response")
    }
}

// ============================================================================
// LlmProvider implementation
// ============================================================================

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn send_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse> {
        tracing::debug!(
            "[OpenAI] Sending {} messages with {} tools",
            messages.len(),
            tools.len()
        );

        let openai_tools = Self::convert_tools(&tools);
        let tool_choice = openai_tools.as_ref().map(|_| "auto".to_string());

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(system, &messages),
            tools: openai_tools,
            tool_choice,
            temperature: self.temperature,
        };

        let response = self.send_openai_request(&request, session_id).await?;
        self.convert_response(response)
    }

    fn model(&self) -> String {
        self.model.clone()
    }
}
