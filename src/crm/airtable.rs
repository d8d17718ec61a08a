//! Airtable records API lead sink

use reqwest::Client;
use serde::Serialize;

use super::{LeadRecord, LeadSink};

const LEAD_CREATED: &str = "Lead created successfully.";
const LEAD_FAILED_PREFIX: &str = "Lead creation failed";

#[derive(Debug, Serialize)]
struct CreateRecordsRequest<'a> {
    records: Vec<RecordFields<'a>>,
}

#[derive(Debug, Serialize)]
struct RecordFields<'a> {
    fields: LeadFields<'a>,
}

#[derive(Debug, Serialize)]
struct LeadFields<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Phone")]
    phone: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "CompanyName")]
    company_name: &'a str,
}

impl<'a> From<&'a LeadRecord> for CreateRecordsRequest<'a> {
    fn from(lead: &'a LeadRecord) -> Self {
        Self {
            records: vec![RecordFields {
                fields: LeadFields {
                    name: &lead.name,
                    phone: &lead.phone,
                    email: &lead.email,
                    company_name: &lead.company_name,
                },
            }],
        }
    }
}

/// Creates one Airtable record per lead
pub struct AirtableLeadSink {
    client: Client,
    url: String,
    api_key: String,
}

impl AirtableLeadSink {
    /// `url` is the full table endpoint, e.g.
    /// `https://api.airtable.com/v0/{base}/{table}`
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait::async_trait]
impl LeadSink for AirtableLeadSink {
    async fn submit(&self, lead: &LeadRecord) -> String {
        tracing::info!(
            "[CRM] Creating lead for {} ({})",
            lead.name,
            lead.company_name
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&CreateRecordsRequest::from(lead))
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("[CRM] Request failed: {}", e);
                return format!("{}: {}", LEAD_FAILED_PREFIX, e);
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            tracing::info!("[CRM] Lead created");
            return LEAD_CREATED.to_string();
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("[CRM] Lead rejected: {} - {}", status, body);
        format!("{}: {}", LEAD_FAILED_PREFIX, body)
    }
}
