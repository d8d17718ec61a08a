use std::sync::Arc;

use anyhow::{Context, Result};
use shlim_assistant::agent::{AgentConfig, StandardAgentFactory, SYSTEM_PROMPT};
use shlim_assistant::config::AppConfig;
use shlim_assistant::core::AssistantError;
use shlim_assistant::crm::AirtableLeadSink;
use shlim_assistant::knowledge::{KnowledgeIndex, OpenAiEmbedder};
use shlim_assistant::llm::OpenAiProvider;
use shlim_assistant::logging;
use shlim_assistant::server::{self, AppState};
use shlim_assistant::session::SessionStore;
use shlim_assistant::shutdown::shutdown_signal;
use shlim_assistant::tools::{CreateLeadTool, KnowledgeSearchTool, ToolRegistry};
use shlim_assistant::tunnel::NgrokTunnel;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the environment may already be set
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref(), config.log_json)?;

    tracing::info!("=== Shlim AI Assistant Starting ===");

    // --- Step 1: Build the knowledge index (once per process) ---
    let embedder = Arc::new(
        OpenAiEmbedder::new(&config.openai_api_key)
            .with_model(&config.embedding_model)
            .with_base_url(&config.openai_base_url),
    );
    let index = Arc::new(
        KnowledgeIndex::from_config(&config.knowledge, embedder)
            .await
            .map_err(AssistantError::knowledge)?,
    );
    tracing::info!("Knowledge index ready: {} chunks", index.len());

    // --- Step 2: Register tools ---
    let mut tools = ToolRegistry::new();
    tools.register(KnowledgeSearchTool::new(index, config.knowledge.top_k));
    tools.register(CreateLeadTool::new(Arc::new(AirtableLeadSink::new(
        config.airtable_url(),
        &config.airtable_api_key,
    ))));
    tracing::info!("Tools registered: {:?}", tools.tool_names());

    // --- Step 3: Create the LLM provider and agent factory ---
    let llm = Arc::new(
        OpenAiProvider::new(&config.openai_api_key)
            .with_model(&config.model)
            .with_temperature(0.0)
            .with_base_url(&config.openai_base_url),
    );
    let agent_config = AgentConfig::new(SYSTEM_PROMPT)
        .with_tools(Arc::new(tools))
        .with_max_tool_iterations(config.max_tool_iterations);
    let factory = Arc::new(StandardAgentFactory::new(agent_config, llm));

    // --- Step 4: Start the HTTP server ---
    let sessions = Arc::new(SessionStore::new(factory));
    let app = server::router(AppState::new(sessions));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    // --- Step 5: Open the public tunnel ---
    let tunnel = if config.tunnel.enabled {
        let tunnel = NgrokTunnel::open(config.port, &config.tunnel).await?;
        tracing::info!("Public URL: {}", tunnel.public_url());
        Some(tunnel)
    } else {
        None
    };

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed");

    if let Some(tunnel) = tunnel {
        if let Err(e) = tunnel.close().await {
            tracing::warn!("Failed to close tunnel cleanly: {:#}", e);
        }
    }

    tracing::info!("=== Shlim AI Assistant Shutting Down ===");

    served
}
