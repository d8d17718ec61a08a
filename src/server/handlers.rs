//! Request handlers for `/start` and `/chat`

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::{AssistantError, AssistantResult};

use super::AppState;

/// Sent when the agent finishes without producing an answer
pub const FALLBACK_RESPONSE: &str = "Sorry, I could not produce an answer.";

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub thread_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Mint a new thread identifier; the session itself is created on first chat
pub async fn start() -> Json<StartResponse> {
    let thread_id = Uuid::new_v4().to_string();
    tracing::info!("[Server] Started thread {}", thread_id);
    Json(StartResponse { thread_id })
}

/// Run one exchange on the caller's thread
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AssistantResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| AssistantError::InvalidRequest(e.body_text()))?;
    let thread_id = match request.thread_id {
        Some(id) if !id.is_empty() => id,
        _ => return Err(AssistantError::MissingThreadId),
    };

    tracing::info!(
        "[Server] Message on thread {}: {}",
        thread_id,
        request.message
    );

    let session = state.sessions.get_or_create(&thread_id).await;
    let reply = session.lock().await.chat(&request.message).await?;

    let response = reply
        .output
        .unwrap_or_else(|| FALLBACK_RESPONSE.to_string());
    tracing::info!("[Server] Reply on thread {}: {}", thread_id, response);

    Ok(Json(ChatResponse { response }))
}
