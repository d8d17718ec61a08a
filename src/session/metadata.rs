//! Session metadata types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bookkeeping for one conversation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Unique session ID (the client's thread_id)
    pub session_id: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the last exchange completed
    pub last_active: DateTime<Utc>,

    /// Number of completed exchanges
    pub exchanges: u64,
}

impl SessionMetadata {
    /// Create metadata for a new session
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            created_at: now,
            last_active: now,
            exchanges: 0,
        }
    }

    /// Record a completed exchange
    pub fn record_exchange(&mut self) {
        self.exchanges += 1;
        self.last_active = Utc::now();
    }
}
