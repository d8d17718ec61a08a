//! Standard Agent Loop
//!
//! The agent implementation behind every session:
//! - Input → LLM → Tools → Output cycle, bounded by `max_tool_iterations`
//! - A scratchpad of tool calls and results that lives for one invocation
//! - A memory buffer of user inputs and final answers that lives for the session

use std::sync::Arc;

use serde_json::Value;

use crate::core::{AssistantError, AssistantResult};
use crate::llm::{ContentBlock, LlmProvider, Message, StopReason};
use crate::tools::ToolResult;

use super::config::AgentConfig;

/// Output used when the loop runs out of iterations
pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// Final result of one agent invocation
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    /// Final answer, `None` when the model produced no text
    pub output: Option<String>,
}

/// A conversational agent bound to one session
#[async_trait::async_trait]
pub trait ChatAgent: Send {
    /// Answer one user message, updating the agent's memory
    async fn invoke(&mut self, input: &str) -> AssistantResult<AgentReply>;

    /// Conversation memory, oldest first
    fn history(&self) -> &[Message];
}

/// Standard agent that handles the full agent loop
///
/// # Example
///
/// ```ignore
/// let config = Arc::new(AgentConfig::new(SYSTEM_PROMPT).with_tools(tools));
/// let mut agent = StandardAgent::new(config, llm);
///
/// let reply = agent.invoke("What does Shlim AI do?").await?;
/// ```
pub struct StandardAgent {
    config: Arc<AgentConfig>,
    llm: Arc<dyn LlmProvider>,
    memory: Vec<Message>,
    session_id: Option<String>,
}

impl StandardAgent {
    /// Create a new standard agent with empty memory
    pub fn new(config: Arc<AgentConfig>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            config,
            llm,
            memory: Vec::new(),
            session_id: None,
        }
    }

    /// Tag LLM requests with the session they belong to
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Run the tool loop for one user input, returning the final answer
    async fn run_turn(&self, user_message: &Message) -> AssistantResult<Option<String>> {
        let tool_definitions = self.config.tool_definitions();

        let mut scratchpad: Vec<Message> = Vec::new();
        let mut iterations = 0;

        // LLM loop - continues until no more tool calls
        loop {
            iterations += 1;
            if iterations > self.config.max_tool_iterations {
                tracing::warn!(
                    "[StandardAgent] Max tool iterations ({}) reached",
                    self.config.max_tool_iterations
                );
                return Ok(Some(ITERATION_LIMIT_OUTPUT.to_string()));
            }

            let mut messages = self.memory.clone();
            messages.push(user_message.clone());
            messages.extend(scratchpad.iter().cloned());

            tracing::info!(
                "[StandardAgent] Calling LLM with {} messages (iteration {})",
                messages.len(),
                iterations
            );

            let response = self
                .llm
                .send_with_tools_and_system(
                    messages,
                    Some(&self.config.system_prompt),
                    tool_definitions.clone(),
                    self.session_id.as_deref(),
                )
                .await
                .map_err(AssistantError::llm)?;

            tracing::info!(
                "[StandardAgent] LLM response: stop_reason={:?}",
                response.stop_reason
            );

            if !response.has_tool_use() {
                if response.stop_reason == Some(StopReason::MaxTokens) {
                    tracing::warn!("[StandardAgent] Response truncated (max tokens)");
                }
                let text = response.text();
                return Ok(if text.is_empty() {
                    None
                } else {
                    Some(text)
                });
            }

            // Process tool use blocks and execute tools
            let mut tool_results: Vec<ContentBlock> = Vec::new();
            for (id, name, input) in response.tool_uses() {
                tracing::info!("[StandardAgent] Tool use: {} ({})", name, id);
                let result = self.execute_tool(name, input).await?;
                tool_results.push(ContentBlock::tool_result(id, result.output, result.is_error));
            }

            scratchpad.push(Message::assistant_with_blocks(response.content));
            scratchpad.push(Message::user_with_blocks(tool_results));
        }
    }

    /// Execute one tool call
    ///
    /// Calls the model can fix (unknown tool, malformed arguments) come back as
    /// error results; a failing collaborator ends the turn.
    async fn execute_tool(&self, name: &str, input: &Value) -> AssistantResult<ToolResult> {
        let Some(tools) = self.config.tools.as_ref() else {
            return Ok(ToolResult::error(format!(
                "No tools configured, cannot execute: {}",
                name
            )));
        };

        if tools.get(name).is_none() {
            tracing::warn!("[StandardAgent] Model requested unknown tool: {}", name);
            return Ok(ToolResult::error(format!(
                "{} is not a valid tool, try one of [{}].",
                name,
                tools.tool_names().join(", ")
            )));
        }

        // The provider passes undecodable arguments through as a raw string
        if let Value::String(raw) = input {
            tracing::warn!("[StandardAgent] Unparseable arguments for {}: {}", name, raw);
            return Ok(ToolResult::error(format!(
                "Could not parse arguments for {} as JSON: {}",
                name, raw
            )));
        }

        tools.execute(name, input).await.map_err(|e| {
            tracing::error!("[StandardAgent] Tool {} failed: {:#}", name, e);
            AssistantError::ToolError(format!("{:#}", e))
        })
    }
}

#[async_trait::async_trait]
impl ChatAgent for StandardAgent {
    async fn invoke(&mut self, input: &str) -> AssistantResult<AgentReply> {
        let user_message = Message::user(input);
        let output = self.run_turn(&user_message).await?;

        // Only the exchange itself is remembered; the scratchpad is dropped
        self.memory.push(user_message);
        self.memory
            .push(Message::assistant(output.clone().unwrap_or_default()));

        Ok(AgentReply { output })
    }

    fn history(&self) -> &[Message] {
        &self.memory
    }
}
