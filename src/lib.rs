pub mod core;
pub mod config;
pub mod logging;

// LLM client and conversation types
pub mod llm;

// Knowledge base indexing and search
pub mod knowledge;

// CRM lead capture
pub mod crm;

// Tools exposed to the agent
pub mod tools;

// Agent loop and per-session construction
pub mod agent;

// Session store
pub mod session;

// HTTP front door
pub mod server;

// Public tunnel
pub mod tunnel;

// Process stop signals
pub mod shutdown;
