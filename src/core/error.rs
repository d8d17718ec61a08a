//! Assistant error types

use thiserror::Error;

/// Errors that can occur while serving a conversation
#[derive(Error, Debug)]
pub enum AssistantError {
    /// Chat request arrived without a thread identifier
    #[error("thread_id missing")]
    MissingThreadId,

    /// Chat request body could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The LLM collaborator failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Building or querying the knowledge index failed
    #[error("Knowledge index error: {0}")]
    Knowledge(String),

    /// Tool execution error
    #[error("Tool error: {0}")]
    ToolError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AssistantError {
    /// Wrap an LLM failure, keeping the whole cause chain
    pub fn llm(err: anyhow::Error) -> Self {
        AssistantError::Llm(format!("{:#}", err))
    }

    /// Wrap a knowledge index failure, keeping the whole cause chain
    pub fn knowledge(err: anyhow::Error) -> Self {
        AssistantError::Knowledge(format!("{:#}", err))
    }

    /// Whether the caller is at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AssistantError::MissingThreadId | AssistantError::InvalidRequest(_)
        )
    }
}

/// Result type alias for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AssistantError::ToolError("embeddings unavailable".into());
        assert_eq!(err.to_string(), "Tool error: embeddings unavailable");

        let err = AssistantError::MissingThreadId;
        assert_eq!(err.to_string(), "thread_id missing");
    }

    #[test]
    fn test_llm_error_keeps_context() {
        let err = anyhow::anyhow!("connection refused").context("Failed to reach OpenAI");
        let err = AssistantError::llm(err);
        assert_eq!(
            err.to_string(),
            "LLM error: Failed to reach OpenAI: connection refused"
        );
    }

    #[test]
    fn test_client_errors() {
        assert!(AssistantError::MissingThreadId.is_client_error());
        assert!(AssistantError::InvalidRequest("not json".into()).is_client_error());
        assert!(!AssistantError::Llm("down".into()).is_client_error());
        assert!(!AssistantError::InvalidConfig("PORT".into()).is_client_error());
    }
}
