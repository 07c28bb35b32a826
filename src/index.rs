//! Per-document vector index.
//!
//! A [`VectorIndex`] holds every chunk of exactly one ingested document
//! together with its embedding. It is immutable once built: a new document
//! produces a new index (a new *generation*), which an
//! [`IndexStore`](crate::store::IndexStore) publishes in place of the old
//! one.
//!
//! Search is brute-force cosine similarity over all chunk vectors. Results
//! are ordered by descending score; equal scores go to the earlier chunk.

use anyhow::anyhow;
use chrono::Utc;
use uuid::Uuid;

use crate::chunk::content_hash;
use crate::embedding::{cosine_similarity, embed_batched, embed_query, EmbeddingProvider};
use crate::error::{Result, ReviewError};
use crate::models::{Chunk, IndexStatus};

/// One similarity-search result. Text is copied out of the index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub sequence_index: usize,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct VectorIndex {
    generation: String,
    model: String,
    dims: usize,
    created_at: i64,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Embed every chunk text and assemble a new index generation.
    ///
    /// All batches are embedded before the index value exists, so a
    /// partially embedded index is never observable.
    pub async fn build(
        provider: &dyn EmbeddingProvider,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Self> {
        if texts.is_empty() {
            return Err(ReviewError::IndexBuild(
                "cannot build an index from zero chunks".to_string(),
            ));
        }

        let vectors = embed_batched(provider, texts, batch_size).await?;

        let chunks = texts
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(i, (text, embedding))| Chunk {
                sequence_index: i,
                text: text.clone(),
                hash: content_hash(text),
                embedding,
            })
            .collect();

        Ok(Self {
            generation: Uuid::new_v4().to_string(),
            model: provider.model_name().to_string(),
            dims: provider.dims(),
            created_at: Utc::now().timestamp(),
            chunks,
        })
    }

    /// Reassemble a persisted index, checking chunk order, hashes and dimensions.
    pub fn from_parts(
        generation: String,
        model: String,
        dims: usize,
        created_at: i64,
        chunks: Vec<Chunk>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(ReviewError::IndexBuild(format!(
                "persisted index {} has no chunks",
                generation
            )));
        }
        for (i, chunk) in chunks.iter().enumerate() {
            if chunk.sequence_index != i {
                return Err(anyhow!(
                    "index {} is missing chunk {} (found {})",
                    generation,
                    i,
                    chunk.sequence_index
                )
                .into());
            }
            if chunk.embedding.len() != dims {
                return Err(anyhow!(
                    "index {} chunk {} has {} dims, expected {}",
                    generation,
                    i,
                    chunk.embedding.len(),
                    dims
                )
                .into());
            }
            if content_hash(&chunk.text) != chunk.hash {
                return Err(anyhow!("index {} chunk {} failed hash check", generation, i).into());
            }
        }
        Ok(Self {
            generation,
            model,
            dims,
            created_at,
            chunks,
        })
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Fail unless `provider` is the one this index was built with.
    pub fn ensure_compatible(&self, provider: &dyn EmbeddingProvider) -> Result<()> {
        if provider.model_name() != self.model || provider.dims() != self.dims {
            return Err(anyhow!(
                "index built with model {} ({} dims) cannot be queried with {} ({} dims)",
                self.model,
                self.dims,
                provider.model_name(),
                provider.dims()
            )
            .into());
        }
        Ok(())
    }

    /// Top-`k` chunks by cosine similarity to `query_vec`.
    pub fn search(&self, query_vec: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .map(|c| (c.sequence_index, cosine_similarity(query_vec, &c.embedding)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                sequence_index: i,
                text: self.chunks[i].text.clone(),
                score,
            })
            .collect()
    }

    /// Embed `text` with `provider` and return the top-`k` chunks.
    pub async fn query(
        &self,
        provider: &dyn EmbeddingProvider,
        text: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>> {
        self.ensure_compatible(provider)?;
        let query_vec = embed_query(provider, text).await?;
        Ok(self.search(&query_vec, k))
    }

    pub fn status(&self) -> IndexStatus {
        IndexStatus {
            generation: self.generation.clone(),
            model: self.model.clone(),
            dims: self.dims,
            chunk_count: self.chunks.len(),
            created_at: chrono::DateTime::from_timestamp(self.created_at, 0)
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| self.created_at.to_string()),
        }
    }
}
