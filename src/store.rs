//! SQLite-backed vector store.
//!
//! Persists (chunk text, metadata, embedding) tuples and serves
//! nearest-neighbour retrieval with a similarity-score threshold. The
//! store is append-only: there is no update or delete operation, and
//! re-ingesting a file appends duplicate entries.
//!
//! Handles are deliberately short-lived. Each request opens the store
//! fresh so writes from concurrent requests are always visible; SQLite's
//! WAL mode is the only write-concurrency protection.

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use crate::config::StorageConfig;
use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::models::{Chunk, RetrievedChunk};

pub struct VectorStore {
    pool: SqlitePool,
}

impl VectorStore {
    /// Open the store, creating the database file and schema on first use.
    pub async fn open(storage: &StorageConfig) -> Result<Self> {
        let db_path = &storage.db_path;

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                locator TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                text TEXT NOT NULL,
                hash TEXT NOT NULL,
                ingested_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS chunk_vectors (
                chunk_id TEXT PRIMARY KEY,
                model TEXT NOT NULL,
                dims INTEGER NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (chunk_id) REFERENCES chunks(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Append chunks and their embeddings. `vectors` must be parallel to
    /// `chunks`. The batch is written in one transaction and is durable
    /// once this returns.
    pub async fn insert_chunks(
        &self,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        anyhow::ensure!(
            chunks.len() == vectors.len(),
            "chunk/vector count mismatch: {} vs {}",
            chunks.len(),
            vectors.len()
        );

        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        for (chunk, vec) in chunks.iter().zip(vectors.iter()) {
            sqlx::query(
                "INSERT INTO chunks (id, source, locator, chunk_index, text, hash, ingested_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.source)
            .bind(&chunk.locator)
            .bind(chunk.chunk_index)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO chunk_vectors (chunk_id, model, dims, embedding) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(model)
            .bind(vec.len() as i64)
            .bind(vec_to_blob(vec))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Retrieve up to `top_k` chunks by cosine similarity against the
    /// query vector, excluding any whose score falls below
    /// `score_threshold`. Results are ordered by score descending.
    pub async fn similarity_search(
        &self,
        query_vec: &[f32],
        top_k: usize,
        score_threshold: f64,
    ) -> Result<Vec<RetrievedChunk>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.source, c.locator, c.text, cv.embedding
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut candidates: Vec<RetrievedChunk> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let vec = blob_to_vec(&blob);
                let score = cosine_similarity(query_vec, &vec) as f64;
                RetrievedChunk {
                    chunk_id: row.get("id"),
                    source: row.get("source"),
                    locator: row.get("locator"),
                    text: row.get("text"),
                    score,
                }
            })
            .filter(|c| c.score >= score_threshold)
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates.truncate(top_k);

        Ok(candidates)
    }

    /// Number of persisted entries.
    pub async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use uuid::Uuid;

    fn storage(tmp: &tempfile::TempDir) -> StorageConfig {
        StorageConfig {
            db_path: tmp.path().join("data").join("index.sqlite"),
            staging_dir: tmp.path().join("uploads"),
        }
    }

    fn chunk(index: i64, text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4().to_string(),
            source: "test.csv".to_string(),
            locator: format!("record {}", index + 1),
            chunk_index: index,
            text: text.to_string(),
            hash: "0".repeat(64),
        }
    }

    #[tokio::test]
    async fn open_creates_schema_and_parent_dirs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = VectorStore::open(&storage(&tmp)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        store.close().await;
    }

    #[tokio::test]
    async fn inserted_chunks_survive_reopen() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cfg = storage(&tmp);

        let store = VectorStore::open(&cfg).await.unwrap();
        let chunks = vec![chunk(0, "alpha"), chunk(1, "beta")];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        store
            .insert_chunks(&chunks, &vectors, "test-model")
            .await
            .unwrap();
        store.close().await;

        let reopened = VectorStore::open(&cfg).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        reopened.close().await;
    }

    #[tokio::test]
    async fn search_respects_threshold_and_top_k() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = VectorStore::open(&storage(&tmp)).await.unwrap();

        // One aligned, one orthogonal, one opposite to the query vector.
        let chunks = vec![chunk(0, "aligned"), chunk(1, "orthogonal"), chunk(2, "opposite")];
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, 0.0]];
        store
            .insert_chunks(&chunks, &vectors, "test-model")
            .await
            .unwrap();

        let query = vec![1.0, 0.0];

        let results = store.similarity_search(&query, 20, 0.1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].text, "aligned");
        assert!(results[0].score >= 0.1);

        // Lowering the threshold admits the orthogonal vector too.
        let results = store.similarity_search(&query, 20, -1.0).await.unwrap();
        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

        // top_k caps the result count.
        let results = store.similarity_search(&query, 2, -1.0).await.unwrap();
        assert_eq!(results.len(), 2);

        store.close().await;
    }

    #[tokio::test]
    async fn search_on_empty_store_returns_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = VectorStore::open(&storage(&tmp)).await.unwrap();
        let results = store.similarity_search(&[1.0, 0.0], 20, 0.1).await.unwrap();
        assert!(results.is_empty());
        store.close().await;
    }

    #[tokio::test]
    async fn store_is_append_only_with_no_dedup() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = VectorStore::open(&storage(&tmp)).await.unwrap();

        // Same text twice, distinct ids: both batches land.
        let first = vec![chunk(0, "same text")];
        let second = vec![chunk(0, "same text")];
        let vectors = vec![vec![1.0, 0.0]];
        store
            .insert_chunks(&first, &vectors, "test-model")
            .await
            .unwrap();
        store
            .insert_chunks(&second, &vectors, "test-model")
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        store.close().await;
    }

    #[tokio::test]
    async fn mismatched_batch_lengths_are_rejected() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = VectorStore::open(&storage(&tmp)).await.unwrap();
        let err = store
            .insert_chunks(&[chunk(0, "a")], &[], "test-model")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mismatch"));
        assert_eq!(store.count().await.unwrap(), 0);
        store.close().await;
    }
}
