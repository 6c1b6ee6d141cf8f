//! SQLite-based index store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For large indexes, consider the sqlite-vec extension or a dedicated
//! vector database.

use super::{cosine_similarity, IndexStore, ScoredWindow, Window};
use crate::error::{LysarkError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

/// SQLite-based index store.
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS windows (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL,
    position INTEGER NOT NULL,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_windows_session_id ON windows(session_id);
"#;

impl SqliteIndexStore {
    /// Create a new SQLite index store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite index store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite index store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    #[instrument(skip(self, windows), fields(count = windows.len()))]
    async fn insert_batch(&self, windows: &[Window]) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| LysarkError::Index(format!("Failed to acquire lock: {}", e)))?;

        let tx = conn.transaction()?;
        for window in windows {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO windows
                (id, session_id, position, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    window.id.to_string(),
                    window.session_id.to_string(),
                    window.position,
                    window.content,
                    Self::embedding_to_bytes(&window.embedding),
                    window.indexed_at.to_rfc3339(),
                ],
            )?;
        }
        tx.commit()?;

        Ok(windows.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(
        &self,
        session_id: Uuid,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<ScoredWindow>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LysarkError::Index(format!("Failed to acquire lock: {}", e)))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT id, session_id, position, content, embedding, indexed_at
            FROM windows
            WHERE session_id = ?1
            "#,
        )?;

        let rows = stmt.query_map(params![session_id.to_string()], |row| {
            let id: String = row.get(0)?;
            let session: String = row.get(1)?;
            let position: i32 = row.get(2)?;
            let content: String = row.get(3)?;
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let indexed_at: String = row.get(5)?;
            Ok((id, session, position, content, embedding_bytes, indexed_at))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (id, session, position, content, embedding_bytes, indexed_at) = row?;

            let embedding = Self::bytes_to_embedding(&embedding_bytes);
            let score = cosine_similarity(query_embedding, &embedding);
            if score < min_score {
                continue;
            }

            let window = Window {
                id: Uuid::parse_str(&id)
                    .map_err(|e| LysarkError::Index(format!("Bad row id: {}", e)))?,
                session_id: Uuid::parse_str(&session)
                    .map_err(|e| LysarkError::Index(format!("Bad session id: {}", e)))?,
                position,
                content,
                embedding,
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            };

            results.push(ScoredWindow { window, score });
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn session_exists(&self, session_id: Uuid) -> Result<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LysarkError::Index(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM windows WHERE session_id = ?1",
            params![session_id.to_string()],
            |row| row.get(0),
        )?;

        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_session(&self, session_id: Uuid) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LysarkError::Index(format!("Failed to acquire lock: {}", e)))?;

        let deleted = conn.execute(
            "DELETE FROM windows WHERE session_id = ?1",
            params![session_id.to_string()],
        )?;

        Ok(deleted)
    }

    async fn window_count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| LysarkError::Index(format!("Failed to acquire lock: {}", e)))?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM windows", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_index_store_roundtrip() {
        let store = SqliteIndexStore::in_memory().unwrap();
        let session = Uuid::new_v4();

        let windows = vec![
            Window::new(session, 0, "Cats are mammals.".to_string(), vec![1.0, 0.0, 1.0]),
            Window::new(session, 1, "Dogs are mammals too.".to_string(), vec![0.0, 1.0, 1.0]),
        ];

        assert_eq!(store.insert_batch(&windows).await.unwrap(), 2);
        assert_eq!(store.window_count().await.unwrap(), 2);
        assert!(store.session_exists(session).await.unwrap());

        let results = store.search(session, &[1.0, 0.0, 1.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].window.content, "Cats are mammals.");
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].window.embedding, vec![1.0, 0.0, 1.0]);
    }

    #[tokio::test]
    async fn test_sqlite_search_respects_min_score() {
        let store = SqliteIndexStore::in_memory().unwrap();
        let session = Uuid::new_v4();

        let windows = vec![
            Window::new(session, 0, "near".to_string(), vec![1.0, 0.0]),
            Window::new(session, 1, "far".to_string(), vec![0.0, 1.0]),
        ];
        store.insert_batch(&windows).await.unwrap();

        let results = store.search(session, &[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].window.content, "near");
    }

    #[tokio::test]
    async fn test_sqlite_delete_session_scoped() {
        let store = SqliteIndexStore::in_memory().unwrap();
        let session_a = Uuid::new_v4();
        let session_b = Uuid::new_v4();

        store
            .insert_batch(&[
                Window::new(session_a, 0, "a".to_string(), vec![1.0]),
                Window::new(session_b, 0, "b".to_string(), vec![1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.delete_session(session_a).await.unwrap(), 1);
        assert!(!store.session_exists(session_a).await.unwrap());
        assert!(store.session_exists(session_b).await.unwrap());
        assert_eq!(store.window_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_sqlite_store_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.db");
        let store = SqliteIndexStore::new(&path).unwrap();

        let session = Uuid::new_v4();
        store
            .insert_batch(&[Window::new(session, 0, "persisted".to_string(), vec![0.5, 0.5])])
            .await
            .unwrap();

        assert!(path.exists());
        assert_eq!(store.window_count().await.unwrap(), 1);
    }
}
