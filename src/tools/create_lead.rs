//! CRM lead creation tool

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::tool::{parse_input, Tool, ToolResult};
use crate::crm::{LeadRecord, LeadSink};
use crate::llm::{ToolDefinition, ToolInputSchema};

/// Saves a prospective customer's contact details to the CRM
pub struct CreateLeadTool {
    sink: Arc<dyn LeadSink>,
}

impl CreateLeadTool {
    pub fn new(sink: Arc<dyn LeadSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for CreateLeadTool {
    fn name(&self) -> &str {
        "create_lead"
    }

    fn description(&self) -> &str {
        "Saves a prospective customer's contact details to the CRM. \
        Name, company name and email are required; phone is optional."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: ToolInputSchema::new()
                .with_properties(json!({
                    "name": {
                        "type": "string",
                        "description": "Full name of the prospective customer"
                    },
                    "company_name": {
                        "type": "string",
                        "description": "Company the prospective customer works for"
                    },
                    "email": {
                        "type": "string",
                        "description": "Email address of the prospective customer"
                    },
                    "phone": {
                        "type": "string",
                        "description": "Phone number (optional, empty string if not given)"
                    }
                }))
                .with_required(&["name", "company_name", "email"]),
        }
    }

    async fn execute(&self, input: &Value) -> Result<ToolResult> {
        let lead: LeadRecord = match parse_input(self.name(), input) {
            Ok(lead) => lead,
            Err(result) => return Ok(result),
        };

        let outcome = self.sink.submit(&lead).await;
        Ok(ToolResult::success(outcome))
    }
}
