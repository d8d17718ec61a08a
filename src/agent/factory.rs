//! Agent construction for new sessions

use std::sync::Arc;

use crate::llm::LlmProvider;

use super::config::AgentConfig;
use super::standard_loop::{ChatAgent, StandardAgent};

/// Builds the agent bound to a newly seen session
pub trait AgentFactory: Send + Sync {
    fn create(&self, session_id: &str) -> Box<dyn ChatAgent>;
}

/// Creates `StandardAgent`s sharing one configuration and LLM client
pub struct StandardAgentFactory {
    config: Arc<AgentConfig>,
    llm: Arc<dyn LlmProvider>,
}

impl StandardAgentFactory {
    pub fn new(config: AgentConfig, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            config: Arc::new(config),
            llm,
        }
    }
}

impl AgentFactory for StandardAgentFactory {
    fn create(&self, session_id: &str) -> Box<dyn ChatAgent> {
        tracing::info!(
            "[AgentFactory] Creating agent for session {} (model {})",
            session_id,
            self.llm.model()
        );
        Box::new(StandardAgent::new(self.config.clone(), self.llm.clone()).with_session_id(session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::standard_loop::scripted::{text, ScriptedLlm};

    #[tokio::test]
    async fn test_agents_do_not_share_memory() {
        let llm = Arc::new(ScriptedLlm::new(vec![text("a"), text("b")]));
        let factory = StandardAgentFactory::new(AgentConfig::new("system"), llm);

        let mut first = factory.create("s1");
        let second = factory.create("s2");

        first.invoke("hello").await.unwrap();
        assert_eq!(first.history().len(), 2);
        assert!(second.history().is_empty());
    }
}
