//! CRM lead capture
//!
//! - `LeadRecord` - contact details collected by the agent
//! - `LeadSink` trait - where leads are submitted
//! - `AirtableLeadSink` - Airtable records API implementation

mod airtable;

pub use airtable::AirtableLeadSink;

use serde::{Deserialize, Serialize};

/// A prospective customer's contact record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub name: String,
    pub company_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Destination for captured leads
///
/// `submit` never fails: the outcome, good or bad, is reported as text that
/// is handed back to the model.
#[async_trait::async_trait]
pub trait LeadSink: Send + Sync {
    async fn submit(&self, lead: &LeadRecord) -> String;
}
