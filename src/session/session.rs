//! A single conversation session
//!
//! Combines the session's metadata with the agent bound to it.

use crate::agent::{AgentReply, ChatAgent};
use crate::core::AssistantResult;
use crate::llm::Message;

use super::metadata::SessionMetadata;

/// A conversation and the agent that carries it
pub struct Session {
    /// Session metadata (identity, timestamps, exchange count)
    pub metadata: SessionMetadata,

    agent: Box<dyn ChatAgent>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, agent: Box<dyn ChatAgent>) -> Self {
        Self {
            metadata: SessionMetadata::new(session_id),
            agent,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.metadata.session_id
    }

    /// Run one exchange through the bound agent
    pub async fn chat(&mut self, input: &str) -> AssistantResult<AgentReply> {
        let reply = self.agent.invoke(input).await?;
        self.metadata.record_exchange();

        tracing::debug!(
            "[Session] {} completed exchange {}",
            self.metadata.session_id,
            self.metadata.exchanges
        );

        Ok(reply)
    }

    /// Conversation memory, oldest first
    pub fn history(&self) -> &[Message] {
        self.agent.history()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("metadata", &self.metadata)
            .field("history_len", &self.history().len())
            .finish()
    }
}
