//! In-memory index store implementation.
//!
//! Useful for testing.

use super::{cosine_similarity, IndexStore, ScoredWindow, Window};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory index store.
pub struct MemoryIndexStore {
    windows: RwLock<HashMap<Uuid, Window>>,
}

impl MemoryIndexStore {
    /// Create a new in-memory index store.
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryIndexStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn insert_batch(&self, windows: &[Window]) -> Result<usize> {
        let mut store = self.windows.write().unwrap();
        for window in windows {
            store.insert(window.id, window.clone());
        }
        Ok(windows.len())
    }

    async fn search(
        &self,
        session_id: Uuid,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredWindow>> {
        let windows = self.windows.read().unwrap();

        let mut results: Vec<ScoredWindow> = windows
            .values()
            .filter(|w| w.session_id == session_id)
            .map(|w| ScoredWindow {
                window: w.clone(),
                score: cosine_similarity(query_embedding, &w.embedding),
            })
            .filter(|r| r.score >= min_score)
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn session_exists(&self, session_id: Uuid) -> Result<bool> {
        let windows = self.windows.read().unwrap();
        Ok(windows.values().any(|w| w.session_id == session_id))
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<usize> {
        let mut windows = self.windows.write().unwrap();
        let initial_len = windows.len();
        windows.retain(|_, w| w.session_id != session_id);
        Ok(initial_len - windows.len())
    }

    async fn window_count(&self) -> Result<usize> {
        let windows = self.windows.read().unwrap();
        Ok(windows.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_index_store() {
        let store = MemoryIndexStore::new();
        let session = Uuid::new_v4();

        let w1 = Window::new(session, 0, "Hello world".to_string(), vec![1.0, 0.0, 0.0]);
        let w2 = Window::new(session, 1, "Goodbye world".to_string(), vec![0.0, 1.0, 0.0]);

        store.insert_batch(&[w1, w2]).await.unwrap();
        assert_eq!(store.window_count().await.unwrap(), 2);

        let results = store.search(session, &[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].window.content, "Hello world");
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = MemoryIndexStore::new();
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();

        let wa = Window::new(session_a, 0, "alpha".to_string(), vec![1.0, 0.0]);
        let wb = Window::new(session_b, 0, "beta".to_string(), vec![1.0, 0.0]);
        store.insert_batch(&[wa, wb]).await.unwrap();

        let results = store.search(session_a, &[1.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].window.content, "alpha");

        assert_eq!(store.delete_session(session_a).await.unwrap(), 1);
        assert!(!store.session_exists(session_a).await.unwrap());
        assert!(store.session_exists(session_b).await.unwrap());
    }
}
