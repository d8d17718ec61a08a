//! Session management
//!
//! - `SessionStore` - process-lifetime map from thread_id to session
//! - `Session` - the agent bound to one thread plus its metadata
//! - `SessionMetadata` - timestamps and exchange count

pub mod metadata;
pub mod session;
pub mod store;

pub use metadata::SessionMetadata;
pub use session::Session;
pub use store::{SessionHandle, SessionStore};
