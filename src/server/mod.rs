//! HTTP front door
//!
//! - `GET /start` mints a thread id
//! - `POST /chat` runs one exchange on a thread
//!
//! Every origin, method and header is allowed through CORS, with credentials;
//! the request's origin is echoed back since `*` cannot carry credentials.

mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::session::SessionStore;

pub use error::ErrorBody;
pub use handlers::{ChatRequest, ChatResponse, StartResponse, FALLBACK_RESPONSE};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self { sessions }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", get(handlers::start))
        .route("/chat", post(handlers::chat))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentFactory, AgentReply, ChatAgent};
    use crate::core::{AssistantError, AssistantResult};
    use crate::llm::Message;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[derive(Clone, Copy)]
    enum Behaviour {
        /// Answer with the number of remembered messages
        EchoHistory,
        /// Finish without an answer
        Silent,
        /// Fail like an unreachable LLM
        Fail,
    }

    struct StubAgent {
        behaviour: Behaviour,
        memory: Vec<Message>,
    }

    #[async_trait::async_trait]
    impl ChatAgent for StubAgent {
        async fn invoke(&mut self, input: &str) -> AssistantResult<AgentReply> {
            let output = match self.behaviour {
                Behaviour::EchoHistory => Some(format!("history={}", self.memory.len())),
                Behaviour::Silent => None,
                Behaviour::Fail => {
                    return Err(AssistantError::Llm("connection refused (api key sk-secret)".into()))
                }
            };
            self.memory.push(Message::user(input));
            self.memory
                .push(Message::assistant(output.clone().unwrap_or_default()));
            Ok(AgentReply { output })
        }

        fn history(&self) -> &[Message] {
            &self.memory
        }
    }

    struct StubFactory {
        behaviour: Behaviour,
        created: AtomicUsize,
    }

    impl AgentFactory for StubFactory {
        fn create(&self, _session_id: &str) -> Box<dyn ChatAgent> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(StubAgent {
                behaviour: self.behaviour,
                memory: Vec::new(),
            })
        }
    }

    fn app(behaviour: Behaviour) -> (Router, Arc<SessionStore>, Arc<StubFactory>) {
        let factory = Arc::new(StubFactory {
            behaviour,
            created: AtomicUsize::new(0),
        });
        let sessions = Arc::new(SessionStore::new(factory.clone()));
        (router(AppState::new(sessions.clone())), sessions, factory)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn start_request() -> Request<Body> {
        Request::builder()
            .uri("/start")
            .body(Body::empty())
            .unwrap()
    }

    fn chat_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_start_returns_fresh_uuids() {
        let (app, sessions, factory) = app(Behaviour::EchoHistory);

        let mut seen = HashSet::new();
        for _ in 0..20 {
            let (status, body) = send(&app, start_request()).await;
            assert_eq!(status, StatusCode::OK);
            let id = body["thread_id"].as_str().unwrap().to_string();
            let parsed = uuid::Uuid::parse_str(&id).unwrap();
            assert_eq!(parsed.get_version_num(), 4);
            assert!(seen.insert(id));
        }

        // Minting an id constructs nothing
        assert!(sessions.is_empty().await);
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chat_without_thread_id_is_rejected() {
        let (app, sessions, factory) = app(Behaviour::EchoHistory);

        let (status, body) = send(&app, chat_request(json!({"thread_id": "", "message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "thread_id missing"}));

        let (status, body) = send(&app, chat_request(json!({"message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "thread_id missing"}));

        let (status, body) = send(&app, chat_request(json!({"thread_id": null, "message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"detail": "thread_id missing"}));

        assert!(sessions.is_empty().await);
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected_with_detail() {
        let (app, sessions, factory) = app(Behaviour::EchoHistory);

        let request = Request::builder()
            .method("POST")
            .uri("/chat")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().starts_with("Invalid request:"));

        let (status, body) = send(&app, chat_request(json!({"thread_id": 42, "message": "hi"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].is_string());

        assert!(sessions.is_empty().await);
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_conversation_end_to_end() {
        let (app, sessions, factory) = app(Behaviour::EchoHistory);

        let (_, body) = send(&app, start_request()).await;
        let thread_id = body["thread_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            chat_request(json!({"thread_id": thread_id, "message": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "history=0");

        let (status, body) = send(
            &app,
            chat_request(json!({"thread_id": thread_id, "message": "again"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], "history=2");

        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        let session = sessions.get(&thread_id).await.unwrap();
        let session = session.lock().await;
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.metadata.exchanges, 2);
    }

    #[tokio::test]
    async fn test_threads_are_isolated() {
        let (app, _, factory) = app(Behaviour::EchoHistory);

        send(&app, chat_request(json!({"thread_id": "a", "message": "1"}))).await;
        send(&app, chat_request(json!({"thread_id": "a", "message": "2"}))).await;
        let (_, body) = send(&app, chat_request(json!({"thread_id": "b", "message": "1"}))).await;

        assert_eq!(body["response"], "history=0");
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_output_uses_fallback() {
        let (app, _, _) = app(Behaviour::Silent);

        let (status, body) = send(&app, chat_request(json!({"thread_id": "t", "message": "hi"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["response"], FALLBACK_RESPONSE);
    }

    #[tokio::test]
    async fn test_agent_failure_is_500_without_details() {
        let (app, sessions, _) = app(Behaviour::Fail);

        let (status, body) = send(&app, chat_request(json!({"thread_id": "t", "message": "hi"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(!detail.contains("sk-secret"));

        // The session exists but remembers nothing
        let session = sessions.get("t").await.unwrap();
        assert!(session.lock().await.history().is_empty());
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin_with_credentials() {
        let (app, _, _) = app(Behaviour::EchoHistory);

        let request = Request::builder()
            .uri("/start")
            .header(header::ORIGIN, "https://shlim.example")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();

        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://shlim.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

        let preflight = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header(header::ORIGIN, "https://other.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(preflight).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://other.example"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");
    }
}
