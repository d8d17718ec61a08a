//! In-memory session store
//!
//! Maps session IDs to sessions for the lifetime of the process. Sessions are
//! created on first contact and never evicted.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::agent::AgentFactory;

use super::session::Session;

/// Shared handle to one session; holding the lock serializes its exchanges
pub type SessionHandle = Arc<Mutex<Session>>;

/// Session ID → session map with atomic create-if-absent
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    factory: Arc<dyn AgentFactory>,
}

impl SessionStore {
    pub fn new(factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            factory,
        }
    }

    /// Return the session for `session_id`, creating it and its agent if absent
    ///
    /// Concurrent first-contact calls for the same ID construct exactly one agent.
    pub async fn get_or_create(&self, session_id: &str) -> SessionHandle {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                tracing::info!("[SessionStore] Creating session {}", session_id);
                let agent = self.factory.create(session_id);
                Arc::new(Mutex::new(Session::new(session_id, agent)))
            })
            .clone()
    }

    /// Look up an existing session
    pub async fn get(&self, session_id: &str) -> Option<SessionHandle> {
        self.sessions.read().await.get(session_id).cloned()
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    /// Number of sessions created so far
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentReply, ChatAgent};
    use crate::core::AssistantResult;
    use crate::llm::Message;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Agent that answers with how many messages it remembers
    #[derive(Default)]
    struct CountingAgent {
        memory: Vec<Message>,
    }

    #[async_trait::async_trait]
    impl ChatAgent for CountingAgent {
        async fn invoke(&mut self, input: &str) -> AssistantResult<AgentReply> {
            let output = format!("history={}", self.memory.len());
            self.memory.push(Message::user(input));
            self.memory.push(Message::assistant(output.clone()));
            Ok(AgentReply {
                output: Some(output),
            })
        }

        fn history(&self) -> &[Message] {
            &self.memory
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl AgentFactory for CountingFactory {
        fn create(&self, _session_id: &str) -> Box<dyn ChatAgent> {
            self.created.fetch_add(1, Ordering::SeqCst);
            Box::new(CountingAgent::default())
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let factory = Arc::new(CountingFactory::default());
        let store = SessionStore::new(factory.clone());

        let first = store.get_or_create("t1").await;
        let again = store.get_or_create("t1").await;
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(factory.created.load(Ordering::SeqCst), 1);

        store.get_or_create("t2").await;
        assert_eq!(factory.created.load(Ordering::SeqCst), 2);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_lookup_does_not_create() {
        let factory = Arc::new(CountingFactory::default());
        let store = SessionStore::new(factory.clone());

        assert!(store.get("t1").await.is_none());
        assert!(!store.contains("t1").await);
        assert!(store.is_empty().await);
        assert_eq!(factory.created.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_contact_creates_one_agent() {
        let factory = Arc::new(CountingFactory::default());
        let store = Arc::new(SessionStore::new(factory.clone()));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_create("shared").await })
            })
            .collect();
        let handles: Vec<SessionHandle> = futures::future::join_all(tasks)
            .await
            .into_iter()
            .map(|joined| joined.unwrap())
            .collect();

        assert_eq!(factory.created.load(Ordering::SeqCst), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    #[tokio::test]
    async fn test_memory_grows_per_exchange() {
        let store = SessionStore::new(Arc::new(CountingFactory::default()));

        let handle = store.get_or_create("t1").await;
        {
            let mut session = handle.lock().await;
            assert_eq!(session.chat("one").await.unwrap().output.unwrap(), "history=0");
            assert_eq!(session.chat("two").await.unwrap().output.unwrap(), "history=2");
            assert_eq!(session.history().len(), 4);
            assert_eq!(session.metadata.exchanges, 2);
            assert_eq!(session.session_id(), "t1");
        }

        // Same session through a fresh lookup
        let handle = store.get_or_create("t1").await;
        assert_eq!(handle.lock().await.history().len(), 4);
    }
}
