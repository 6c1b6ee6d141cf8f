//! Session-keyed retrieval index.
//!
//! Splits a transcript into overlapping text windows, embeds them, and
//! stores (window, vector) rows keyed by a session identifier. Search is
//! scoped to one session, so concurrent requests never read each other's
//! transcripts.

mod memory;
mod sqlite;

pub use memory::MemoryIndexStore;
pub use sqlite::SqliteIndexStore;

use crate::embedding::Embedder;
use crate::error::{LysarkError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// A text window stored in the retrieval index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Unique row ID.
    pub id: Uuid,
    /// Session this window belongs to.
    pub session_id: Uuid,
    /// Order of this window in the transcript.
    pub position: i32,
    /// Text content of this window.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this window was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl Window {
    /// Create a new window row.
    pub fn new(session_id: Uuid, position: i32, content: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id,
            position,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct ScoredWindow {
    /// The matched window.
    pub window: Window,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for index store implementations.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Bulk insert windows for a session.
    async fn insert_batch(&self, windows: &[Window]) -> Result<usize>;

    /// Search one session's windows for similarity to a query embedding.
    async fn search(
        &self,
        session_id: Uuid,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredWindow>>;

    /// Whether any windows exist for a session.
    async fn session_exists(&self, session_id: Uuid) -> Result<bool>;

    /// Delete all windows for a session. Returns the number removed.
    async fn delete_session(&self, session_id: Uuid) -> Result<usize>;

    /// Total window count across all sessions.
    async fn window_count(&self) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Split text into overlapping character windows.
///
/// The stride is `size - overlap`; boundaries never split a codepoint.
pub fn split_windows(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || size == 0 {
        return Vec::new();
    }

    let stride = size.saturating_sub(overlap).max(1);
    let chars: Vec<char> = text.chars().collect();

    let mut windows = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if !window.trim().is_empty() {
            windows.push(window);
        }
        if end == chars.len() {
            break;
        }
        start += stride;
    }

    windows
}

/// Builds a session's retrieval index from a transcript.
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn IndexStore>,
    window_size: usize,
    window_overlap: usize,
}

impl IndexBuilder {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn IndexStore>,
        window_size: usize,
        window_overlap: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            window_size,
            window_overlap,
        }
    }

    /// Split, embed and store a transcript under a session ID.
    ///
    /// Replaces any rows the session already had. Fails fast with
    /// `InvalidInput` when splitting yields no windows.
    #[instrument(skip(self, transcript), fields(session = %session_id, chars = transcript.len()))]
    pub async fn build(&self, session_id: Uuid, transcript: &str) -> Result<usize> {
        let texts = split_windows(transcript, self.window_size, self.window_overlap);
        if texts.is_empty() {
            return Err(LysarkError::InvalidInput(
                "Transcript could not be split into windows".to_string(),
            ));
        }

        debug!("Embedding {} windows", texts.len());
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != texts.len() {
            return Err(LysarkError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                embeddings.len()
            )));
        }

        let windows: Vec<Window> = texts
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (content, embedding))| {
                Window::new(session_id, i as i32, content, embedding)
            })
            .collect();

        // Rebuilds replace the session's rows wholesale
        self.store.delete_session(session_id).await?;
        let inserted = self.store.insert_batch(&windows).await?;

        info!("Indexed {} windows for session {}", inserted, session_id);
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// Deterministic embedder for tests: direction encodes which marker
    /// words the text contains.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let lower = text.to_lowercase();
            Ok(vec![
                if lower.contains("cat") { 1.0 } else { 0.0 },
                if lower.contains("dog") { 1.0 } else { 0.0 },
                if lower.contains("mammal") { 1.0 } else { 0.0 },
            ])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_split_windows_overlap() {
        let text = "abcdefghij";
        let windows = split_windows(text, 4, 2);
        assert_eq!(windows, vec!["abcd", "cdef", "efgh", "ghij"]);
    }

    #[test]
    fn test_split_windows_short_text_is_one_window() {
        let windows = split_windows("short", 500, 50);
        assert_eq!(windows, vec!["short"]);
    }

    #[test]
    fn test_split_windows_empty_text() {
        assert!(split_windows("", 500, 50).is_empty());
        assert!(split_windows("   \n  ", 500, 50).is_empty());
    }

    #[test]
    fn test_split_windows_multibyte_safe() {
        let text = "æøå".repeat(10);
        let windows = split_windows(&text, 7, 2);
        assert!(!windows.is_empty());
        assert!(windows.iter().all(|w| w.chars().count() <= 7));
    }

    #[tokio::test]
    async fn test_build_fails_fast_on_empty_transcript() {
        let builder = IndexBuilder::new(
            Arc::new(StubEmbedder),
            Arc::new(MemoryIndexStore::new()),
            500,
            50,
        );
        let err = builder.build(Uuid::new_v4(), "  ").await.unwrap_err();
        assert!(matches!(err, LysarkError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_build_replaces_session_rows() {
        let store = Arc::new(MemoryIndexStore::new());
        let builder = IndexBuilder::new(Arc::new(StubEmbedder), store.clone(), 20, 5);
        let session = Uuid::new_v4();

        builder
            .build(session, "Cats are mammals. Dogs are mammals too.")
            .await
            .unwrap();
        let first_count = store.window_count().await.unwrap();

        builder.build(session, "Cats are mammals.").await.unwrap();
        let second_count = store.window_count().await.unwrap();

        assert!(second_count <= first_count);
        assert!(store.session_exists(session).await.unwrap());
    }

    #[tokio::test]
    async fn test_retrieval_scenario_cats_and_dogs() {
        let store = Arc::new(MemoryIndexStore::new());
        let embedder = Arc::new(StubEmbedder);
        let builder = IndexBuilder::new(embedder.clone(), store.clone(), 25, 5);
        let session = Uuid::new_v4();

        builder
            .build(session, "Cats are mammals. Dogs are mammals too.")
            .await
            .unwrap();

        let query = embedder.embed("What are cats?").await.unwrap();
        let results = store.search(session, &query, 2, 0.0).await.unwrap();

        assert!(!results.is_empty());
        assert!(results[0].window.content.to_lowercase().contains("mammal"));
        assert!(results[0].window.content.to_lowercase().contains("cat"));
    }
}
