//! Application configuration
//!
//! All settings come from the process environment. A `.env` file in the working
//! directory is loaded first when present (see `main.rs`).

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::core::{AssistantError, AssistantResult};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_AIRTABLE_BASE_ID: &str = "appG0pukRuaxpoSqq";
const DEFAULT_AIRTABLE_TABLE: &str = "Leads";
const AIRTABLE_API_BASE: &str = "https://api.airtable.com/v0";

/// Chunking and retrieval settings for the knowledge index
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeConfig {
    /// Source document
    pub source_path: PathBuf,
    /// Directory holding the index snapshot
    pub index_dir: PathBuf,
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Characters shared between neighbouring chunks
    pub chunk_overlap: usize,
    /// Number of chunks returned per search
    pub top_k: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("knowledge.docx"),
            index_dir: PathBuf::from("./index_db"),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
        }
    }
}

/// Public tunnel settings
#[derive(Debug, Clone, PartialEq)]
pub struct TunnelConfig {
    pub enabled: bool,
    /// ngrok executable
    pub binary: String,
}

/// Complete runtime configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub airtable_api_key: String,
    pub airtable_base_id: String,
    pub airtable_table: String,
    pub host: String,
    pub port: u16,
    pub max_tool_iterations: usize,
    pub knowledge: KnowledgeConfig,
    pub tunnel: TunnelConfig,
    /// When set, logs are also written to daily-rolling files here
    pub log_dir: Option<PathBuf>,
    /// Emit stderr logs as JSON lines
    pub log_json: bool,
}

impl AppConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> AssistantResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> AssistantResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let openai_api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            AssistantError::InvalidConfig("OPENAI_API_KEY environment variable not set".into())
        })?;
        let airtable_api_key = get("AIRTABLE_API_KEY").ok_or_else(|| {
            AssistantError::InvalidConfig("AIRTABLE_API_KEY environment variable not set".into())
        })?;

        let defaults = KnowledgeConfig::default();
        let knowledge = KnowledgeConfig {
            source_path: get("KNOWLEDGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            index_dir: get("INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.index_dir),
            chunk_size: parse_or(get("CHUNK_SIZE"), "CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(get("CHUNK_OVERLAP"), "CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_or(get("SEARCH_TOP_K"), "SEARCH_TOP_K", defaults.top_k)?,
        };

        if knowledge.chunk_size == 0 {
            return Err(AssistantError::InvalidConfig(
                "CHUNK_SIZE must be greater than zero".into(),
            ));
        }
        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(AssistantError::InvalidConfig(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_SIZE ({})",
                knowledge.chunk_overlap, knowledge.chunk_size
            )));
        }

        let tunnel = TunnelConfig {
            enabled: parse_flag(get("TUNNEL_ENABLED"), "TUNNEL_ENABLED")?,
            binary: get("NGROK_BIN").unwrap_or_else(|| "ngrok".to_string()),
        };

        Ok(Self {
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE.to_string()),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            embedding_model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            airtable_api_key,
            airtable_base_id: get("AIRTABLE_BASE_ID")
                .unwrap_or_else(|| DEFAULT_AIRTABLE_BASE_ID.to_string()),
            airtable_table: get("AIRTABLE_TABLE")
                .unwrap_or_else(|| DEFAULT_AIRTABLE_TABLE.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get("PORT"), "PORT", DEFAULT_PORT)?,
            max_tool_iterations: parse_or(get("MAX_TOOL_ITERATIONS"), "MAX_TOOL_ITERATIONS", 15)?,
            knowledge,
            tunnel,
            log_dir: get("LOG_DIR").map(PathBuf::from),
            log_json: parse_log_format(get("LOG_FORMAT"))?,
        })
    }

    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> AssistantResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AssistantError::InvalidConfig(format!("Invalid HOST/PORT: {}", e)))
    }

    /// Airtable records endpoint for the configured base and table
    pub fn airtable_url(&self) -> String {
        format!(
            "{}/{}/{}",
            AIRTABLE_API_BASE, self.airtable_base_id, self.airtable_table
        )
    }
}

fn parse_or<T: std::str::FromStr>(
    raw: Option<String>,
    key: &str,
    default: T,
) -> AssistantResult<T> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            AssistantError::InvalidConfig(format!("{} has an invalid value: {}", key, value))
        }),
        None => Ok(default),
    }
}

fn parse_log_format(raw: Option<String>) -> AssistantResult<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if v == "text" => Ok(false),
        Some(v) if v == "json" => Ok(true),
        Some(v) => Err(AssistantError::InvalidConfig(format!(
            "LOG_FORMAT must be \"text\" or \"json\", got {}",
            v
        ))),
    }
}

fn parse_flag(raw: Option<String>, key: &str) -> AssistantResult<bool> {
    match raw.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(AssistantError::InvalidConfig(format!(
            "{} has an invalid value: {}",
            key, v
        ))),
    }
}
