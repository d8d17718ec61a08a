//! Tool system for the assistant
//!
//! This module provides:
//! - `Tool` trait - Interface for implementing tools
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - Registry for managing available tools
//! - `KnowledgeSearchTool` and `CreateLeadTool` - the assistant's two tools

mod create_lead;
mod knowledge_search;
mod registry;
mod tool;

pub use create_lead::CreateLeadTool;
pub use knowledge_search::{KnowledgeSearchTool, NO_RESULTS};
pub use registry::ToolRegistry;
pub use tool::{parse_input, Tool, ToolResult};
