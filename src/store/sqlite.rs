//! SQLite-backed [`IndexStore`].
//!
//! The live generation is a single row in `index_meta`; its chunks live in
//! `index_chunks` keyed by `(generation, sequence_index)`. A replace
//! deletes the old rows and inserts the new ones inside one transaction,
//! so a reader in any process sees one complete generation. Within the
//! process, the committed index is cached as an `Arc`. Every `load` checks
//! the persisted generation id and reloads when another process (a CLI
//! `ingest` next to a running server) has replaced it.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::embedding::{blob_to_vec, vec_to_blob};
use crate::error::Result;
use crate::index::VectorIndex;
use crate::migrate;
use crate::models::Chunk;

use super::IndexStore;

pub struct SqliteIndexStore {
    pool: SqlitePool,
    cached: RwLock<Option<Arc<VectorIndex>>>,
    // Serializes writers and cache fills so the cache always matches the
    // last committed generation.
    write_lock: Mutex<()>,
}

impl SqliteIndexStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            cached: RwLock::new(None),
            write_lock: Mutex::new(()),
        }
    }

    /// Open (creating if needed) the WAL-mode database at `[db].path` and
    /// ensure the schema exists.
    pub async fn open(config: &Config) -> Result<Self> {
        let path = &config.db.path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        migrate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn cached(&self) -> Result<Option<Arc<VectorIndex>>> {
        let cached = self
            .cached
            .read()
            .map_err(|_| anyhow!("index cache lock poisoned"))?;
        Ok(cached.clone())
    }

    fn set_cached(&self, index: Arc<VectorIndex>) -> Result<()> {
        let mut cached = self
            .cached
            .write()
            .map_err(|_| anyhow!("index cache lock poisoned"))?;
        *cached = Some(index);
        Ok(())
    }

    async fn persisted_generation(&self) -> Result<Option<String>> {
        let generation: Option<String> =
            sqlx::query_scalar("SELECT generation FROM index_meta WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;
        Ok(generation)
    }

    async fn read_persisted(&self) -> Result<Option<VectorIndex>> {
        let mut tx = self.pool.begin().await?;

        let meta = sqlx::query(
            "SELECT generation, model, dims, created_at, chunk_count FROM index_meta WHERE id = 1",
        )
        .fetch_optional(&mut *tx)
        .await?;

        let meta = match meta {
            Some(row) => row,
            None => return Ok(None),
        };

        let generation: String = meta.try_get("generation")?;
        let model: String = meta.try_get("model")?;
        let dims: i64 = meta.try_get("dims")?;
        let created_at: i64 = meta.try_get("created_at")?;
        let chunk_count: i64 = meta.try_get("chunk_count")?;

        let rows = sqlx::query(
            "SELECT sequence_index, text, hash, embedding FROM index_chunks \
             WHERE generation = ? ORDER BY sequence_index",
        )
        .bind(&generation)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        if rows.len() as i64 != chunk_count {
            return Err(anyhow!(
                "index {} lists {} chunks but {} are stored",
                generation,
                chunk_count,
                rows.len()
            )
            .into());
        }

        let mut chunks = Vec::with_capacity(rows.len());
        for row in rows {
            let sequence_index: i64 = row.try_get("sequence_index")?;
            let blob: Vec<u8> = row.try_get("embedding")?;
            chunks.push(Chunk {
                sequence_index: sequence_index as usize,
                text: row.try_get("text")?,
                hash: row.try_get("hash")?,
                embedding: blob_to_vec(&blob),
            });
        }

        let index = VectorIndex::from_parts(generation, model, dims as usize, created_at, chunks)?;
        Ok(Some(index))
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    async fn replace(&self, index: VectorIndex) -> Result<Arc<VectorIndex>> {
        let _writer = self.write_lock.lock().await;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM index_chunks")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM index_meta")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO index_meta (id, generation, model, dims, created_at, chunk_count) \
             VALUES (1, ?, ?, ?, ?, ?)",
        )
        .bind(index.generation())
        .bind(index.model())
        .bind(index.dims() as i64)
        .bind(index.created_at())
        .bind(index.len() as i64)
        .execute(&mut *tx)
        .await?;

        for chunk in index.chunks() {
            sqlx::query(
                "INSERT INTO index_chunks (generation, sequence_index, text, hash, embedding) \
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(index.generation())
            .bind(chunk.sequence_index as i64)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .bind(vec_to_blob(&chunk.embedding))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let published = Arc::new(index);
        self.set_cached(published.clone())?;
        tracing::debug!(
            generation = published.generation(),
            chunks = published.len(),
            "index replaced"
        );
        Ok(published)
    }

    async fn load(&self) -> Result<Option<Arc<VectorIndex>>> {
        let persisted = match self.persisted_generation().await? {
            Some(generation) => generation,
            None => return Ok(None),
        };
        if let Some(index) = self.cached()? {
            if index.generation() == persisted {
                return Ok(Some(index));
            }
        }

        let _writer = self.write_lock.lock().await;
        match self.read_persisted().await? {
            Some(index) => {
                let published = Arc::new(index);
                self.set_cached(published.clone())?;
                tracing::info!(
                    generation = published.generation(),
                    chunks = published.len(),
                    "loaded persisted index"
                );
                Ok(Some(published))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashProvider;
    use tempfile::TempDir;

    async fn open_store(tmp: &TempDir) -> SqliteIndexStore {
        let config = Config::minimal(tmp.path().join("data").join("index.sqlite"));
        SqliteIndexStore::open(&config).await.unwrap()
    }

    async fn build(texts: &[&str]) -> VectorIndex {
        let provider = HashProvider::new(32).unwrap();
        let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        VectorIndex::build(&provider, &texts, 8).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_has_no_index() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_index_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let generation = {
            let store = open_store(&tmp).await;
            let index = store
                .replace(build(&["first clause", "second clause"]).await)
                .await
                .unwrap();
            store.pool().close().await;
            index.generation().to_string()
        };

        let reopened = open_store(&tmp).await;
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded.generation(), generation);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.chunks()[1].text, "second clause");
        assert_eq!(loaded.dims(), 32);
    }

    #[tokio::test]
    async fn test_replace_leaves_no_rows_from_previous_generation() {
        let tmp = TempDir::new().unwrap();
        let store = open_store(&tmp).await;
        store.replace(build(&["a", "b", "c"]).await).await.unwrap();
        let second = store.replace(build(&["d"]).await).await.unwrap();

        let generations: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT generation FROM index_chunks")
                .fetch_all(store.pool())
                .await
                .unwrap();
        assert_eq!(generations, vec![second.generation().to_string()]);

        let reopened = SqliteIndexStore::new(store.pool().clone());
        let loaded = reopened.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.chunks()[0].text, "d");
    }

    #[tokio::test]
    async fn test_second_store_sees_replace_from_first() {
        let tmp = TempDir::new().unwrap();
        let cli = open_store(&tmp).await;
        let server = open_store(&tmp).await;

        cli.replace(build(&["old document"]).await).await.unwrap();
        let before = server.load().await.unwrap().unwrap();
        assert_eq!(before.chunks()[0].text, "old document");

        let second = cli
            .replace(build(&["new document", "second page"]).await)
            .await
            .unwrap();
        let after = server.load().await.unwrap().unwrap();
        assert_eq!(after.generation(), second.generation());
        assert_eq!(after.len(), 2);
        assert_eq!(after.chunks()[0].text, "new document");

        // Unchanged generation comes back from the cache.
        let again = server.load().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&after, &again));
    }
}
