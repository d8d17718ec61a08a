//! Knowledge base search tool

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::tool::{parse_input, Tool, ToolResult};
use crate::knowledge::KnowledgeIndex;
use crate::llm::{ToolDefinition, ToolInputSchema};

pub const NO_RESULTS: &str = "No information about this topic was found in the knowledge base.";

/// Searches the company knowledge document for passages relevant to a query
pub struct KnowledgeSearchTool {
    index: Arc<KnowledgeIndex>,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
struct SearchInput {
    query: String,
}

impl KnowledgeSearchTool {
    pub fn new(index: Arc<KnowledgeIndex>, top_k: usize) -> Self {
        Self { index, top_k }
    }
}

/// Number the passages for the model; an empty result becomes the sentinel text
fn format_results(passages: &[String]) -> String {
    if passages.is_empty() {
        return NO_RESULTS.to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Relevant information {}:\n{}\n", i + 1, text))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Searches the Shlim AI knowledge document for information about the company, \
        its services, leadership, customers and delivery process."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::new()
                .with_properties(json!({
                    "query": {
                        "type": "string",
                        "description": "The search query"
                    }
                }))
                .with_required(&["query"]),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let input: SearchInput = match parse_input(self.name(), input) {
            Ok(input) => input,
            Err(result) => return Ok(result),
        };

        tracing::info!("[KnowledgeSearch] Query: {}", input.query);

        let passages = self
            .index
            .search(&input.query, self.top_k)
            .await
            .context("Knowledge base search failed")?;

        tracing::debug!("[KnowledgeSearch] {} passages found", passages.len());

        Ok(ToolResult::success(format_results(&passages)))
    }
}
