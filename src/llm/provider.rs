//! LLM Provider trait
//!
//! Abstracts the chat-completion interface so the agent loop can run against
//! OpenAI in production and scripted fakes in tests.

use anyhow::Result;

use super::types::{Message, MessageResponse, ToolDefinition};

/// Trait for LLM providers usable by the agent loop.
///
/// All providers work with the same internal message types. Providers that use a
/// different wire format handle translation internally.
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request with tools and system prompt, returning the full response.
    ///
    /// The model decides on its own whether to call any of `tools`.
    async fn send_with_tools_and_system(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
        session_id: Option<&str>,
    ) -> Result<MessageResponse>;

    /// Get the current model name.
    fn model(&self) -> String;
}
