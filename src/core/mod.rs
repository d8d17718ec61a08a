//! Core types shared across the assistant
//!
//! - `AssistantError` / `AssistantResult` - Error types

pub mod error;

pub use error::{AssistantError, AssistantResult};
