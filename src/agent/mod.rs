//! Agent implementation
//!
//! - `AgentConfig` - system prompt, tools and loop bound
//! - `StandardAgent` - tool-calling loop with per-session memory
//! - `AgentFactory` - builds the agent for a newly seen session

mod config;
mod factory;
mod standard_loop;
pub mod system_prompt;

pub use config::AgentConfig;
pub use factory::{AgentFactory, StandardAgentFactory};
pub use standard_loop::{AgentReply, ChatAgent, StandardAgent, ITERATION_LIMIT_OUTPUT};
pub use system_prompt::{default_system_prompt, SYSTEM_PROMPT};
