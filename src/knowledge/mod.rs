//! Knowledge base: document loading, splitting, embeddings and semantic search

pub mod embeddings;
pub mod index;
pub mod loader;
pub mod splitter;

pub use embeddings::{Embedder, OpenAiEmbedder};
pub use index::{KnowledgeChunk, KnowledgeIndex};
pub use loader::load_document;
pub use splitter::TextSplitter;
