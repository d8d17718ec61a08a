//! In-memory vector index over the knowledge document
//!
//! The document is split, embedded once, and searched by cosine similarity.
//! Embeddings are snapshotted to `{index_dir}/index.json` so a restart with an
//! unchanged document and model does not pay for embedding again.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::KnowledgeConfig;

use super::embeddings::Embedder;
use super::loader::load_document;
use super::splitter::TextSplitter;

const SNAPSHOT_FILE: &str = "index.json";

/// A span of the source document and its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// On-disk form of a built index
#[derive(Debug, Serialize, Deserialize)]
struct IndexSnapshot {
    model: String,
    chunk_size: usize,
    chunk_overlap: usize,
    created_at: DateTime<Utc>,
    chunks: Vec<KnowledgeChunk>,
}

impl IndexSnapshot {
    /// Whether this snapshot was built from exactly these chunks with this model
    fn matches(&self, model: &str, texts: &[String]) -> bool {
        self.model == model
            && self.chunks.len() == texts.len()
            && self
                .chunks
                .iter()
                .zip(texts)
                .all(|(chunk, text)| &chunk.text == text)
    }
}

/// Read-only semantic index, shared across sessions
pub struct KnowledgeIndex {
    chunks: Vec<KnowledgeChunk>,
    embedder: Arc<dyn Embedder>,
}

impl KnowledgeIndex {
    /// Read the configured source document and build the index from it
    pub async fn from_config(config: &KnowledgeConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let text = load_document(&config.source_path).with_context(|| {
            format!(
                "Failed to read knowledge source {}",
                config.source_path.display()
            )
        })?;

        let splitter = TextSplitter::new(config.chunk_size, config.chunk_overlap);
        Self::build(&text, &splitter, embedder, Some(&config.index_dir)).await
    }

    /// Split and embed `text`
    ///
    /// When `index_dir` is given, a matching snapshot there is reused and a fresh
    /// build is written back to it.
    pub async fn build(
        text: &str,
        splitter: &TextSplitter,
        embedder: Arc<dyn Embedder>,
        index_dir: Option<&Path>,
    ) -> Result<Self> {
        let texts = splitter.split_text(text);
        tracing::info!("[Knowledge] Split document into {} chunks", texts.len());

        if let Some(dir) = index_dir {
            if let Some(snapshot) = load_snapshot(&snapshot_path(dir)) {
                if snapshot.matches(embedder.model(), &texts) {
                    tracing::info!(
                        "[Knowledge] Reusing index snapshot from {} ({} chunks)",
                        snapshot.created_at,
                        snapshot.chunks.len()
                    );
                    return Ok(Self {
                        chunks: snapshot.chunks,
                        embedder,
                    });
                }
                tracing::info!("[Knowledge] Index snapshot is stale, rebuilding");
            }
        }

        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            embedder
                .embed(&texts)
                .await
                .context("Failed to embed knowledge chunks")?
        };

        if embeddings.len() != texts.len() {
            anyhow::bail!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                texts.len()
            );
        }

        let chunks: Vec<KnowledgeChunk> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(id, (text, embedding))| KnowledgeChunk {
                id,
                text,
                embedding,
            })
            .collect();

        if let Some(dir) = index_dir {
            let snapshot = IndexSnapshot {
                model: embedder.model().to_string(),
                chunk_size: splitter.chunk_size(),
                chunk_overlap: splitter.chunk_overlap(),
                created_at: Utc::now(),
                chunks,
            };
            if let Err(e) = save_snapshot(dir, &snapshot) {
                tracing::warn!("[Knowledge] Failed to write index snapshot: {:#}", e);
            }
            return Ok(Self {
                chunks: snapshot.chunks,
                embedder,
            });
        }

        Ok(Self { chunks, embedder })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    /// Return the texts of the `k` chunks most similar to `query`, best first
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<String>> {
        if self.chunks.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .context("Failed to embed search query")?
            .into_iter()
            .next()
            .context("Embedder returned no vector for the query")?;

        let mut scored: Vec<(f32, &KnowledgeChunk)> = self
            .chunks
            .iter()
            .map(|chunk| (cosine_similarity(&query_vector, &chunk.embedding), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        tracing::debug!(
            "[Knowledge] Query {:?} best score {:.3}",
            query,
            scored.first().map(|(score, _)| *score).unwrap_or_default()
        );

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, chunk)| chunk.text.clone())
            .collect())
    }
}

fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join(SNAPSHOT_FILE)
}

fn load_snapshot(path: &Path) -> Option<IndexSnapshot> {
    if !path.exists() {
        return None;
    }

    let loaded = File::open(path)
        .map_err(anyhow::Error::from)
        .and_then(|file| Ok(serde_json::from_reader(BufReader::new(file))?));

    match loaded {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(
                "[Knowledge] Ignoring unreadable snapshot {}: {:#}",
                path.display(),
                e
            );
            None
        }
    }
}

fn save_snapshot(dir: &Path, snapshot: &IndexSnapshot) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create index directory {}", dir.display()))?;

    let path = snapshot_path(dir);
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), snapshot)?;

    tracing::info!("[Knowledge] Wrote index snapshot to {}", path.display());
    Ok(())
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::embeddings::LetterEmbedder;
    use tempfile::TempDir;

    const DOC: &str = "aaaa\n\nzzzz\n\nmmmm";

    fn splitter() -> TextSplitter {
        TextSplitter::new(5, 0)
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let index = KnowledgeIndex::build(DOC, &splitter(), embedder, None)
            .await
            .unwrap();

        assert_eq!(index.len(), 3);
        let hits = index.search("zz", 1).await.unwrap();
        assert_eq!(hits, vec!["zzzz"]);

        let hits = index.search("mam", 2).await.unwrap();
        assert_eq!(hits, vec!["mmmm", "aaaa"]);
    }

    #[tokio::test]
    async fn test_k_larger_than_index_returns_everything() {
        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let index = KnowledgeIndex::build(DOC, &splitter(), embedder, None)
            .await
            .unwrap();
        assert_eq!(index.search("a", 10).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_empty_document_searches_to_nothing() {
        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let index = KnowledgeIndex::build("   ", &splitter(), embedder.clone(), None)
            .await
            .unwrap();

        assert!(index.is_empty());
        assert!(index.search("anything", 3).await.unwrap().is_empty());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_is_reused() {
        let dir = TempDir::new().unwrap();

        let first = Arc::new(LetterEmbedder::new("letters"));
        let built = KnowledgeIndex::build(DOC, &splitter(), first.clone(), Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(first.calls(), 3);
        assert!(dir.path().join("index.json").exists());

        let second = Arc::new(LetterEmbedder::new("letters"));
        let reused = KnowledgeIndex::build(DOC, &splitter(), second.clone(), Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(second.calls(), 0);
        assert_eq!(reused.chunks(), built.chunks());
    }

    #[tokio::test]
    async fn test_snapshot_is_rebuilt_when_stale() {
        let dir = TempDir::new().unwrap();

        let embedder = Arc::new(LetterEmbedder::new("letters"));
        KnowledgeIndex::build(DOC, &splitter(), embedder, Some(dir.path()))
            .await
            .unwrap();

        // Different model
        let other_model = Arc::new(LetterEmbedder::new("letters-v2"));
        KnowledgeIndex::build(DOC, &splitter(), other_model.clone(), Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(other_model.calls(), 3);

        // Different document
        let changed = Arc::new(LetterEmbedder::new("letters-v2"));
        KnowledgeIndex::build("aaaa\n\nbbbb", &splitter(), changed.clone(), Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(changed.calls(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.json"), "{ not json").unwrap();

        let embedder = Arc::new(LetterEmbedder::new("letters"));
        let index = KnowledgeIndex::build(DOC, &splitter(), embedder.clone(), Some(dir.path()))
            .await
            .unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(embedder.calls(), 3);
    }

    #[tokio::test]
    async fn test_from_config_reads_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("knowledge.md");
        fs::write(&source, DOC).unwrap();

        let config = KnowledgeConfig {
            source_path: source,
            index_dir: dir.path().join("index"),
            chunk_size: 5,
            chunk_overlap: 0,
            top_k: 3,
        };
        let index = KnowledgeIndex::from_config(&config, Arc::new(LetterEmbedder::new("letters")))
            .await
            .unwrap();
        assert_eq!(index.len(), 3);
        assert!(config.index_dir.join("index.json").exists());
    }

    #[tokio::test]
    async fn test_from_config_reads_docx_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("knowledge.docx");
        crate::knowledge::loader::tests::write_docx(
            &source,
            "<w:p><w:r><w:t>Shlim AI builds agents.</w:t></w:r></w:p>\
             <w:p><w:r><w:t>Contact us for a demo.</w:t></w:r></w:p>",
        );

        let config = KnowledgeConfig {
            source_path: source,
            index_dir: dir.path().join("index"),
            chunk_size: 30,
            chunk_overlap: 0,
            top_k: 3,
        };
        let index = KnowledgeIndex::from_config(&config, Arc::new(LetterEmbedder::new("letters")))
            .await
            .unwrap();

        let texts: Vec<&str> = index.chunks().iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["Shlim AI builds agents.", "Contact us for a demo."]);
    }

    #[tokio::test]
    async fn test_from_config_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let config = KnowledgeConfig {
            source_path: dir.path().join("missing.md"),
            index_dir: dir.path().join("index"),
            ..KnowledgeConfig::default()
        };
        let result =
            KnowledgeIndex::from_config(&config, Arc::new(LetterEmbedder::new("letters"))).await;
        let err = result.err().unwrap();
        assert!(err.to_string().contains("missing.md"));
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
