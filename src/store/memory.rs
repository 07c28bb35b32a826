//! In-memory [`IndexStore`] for tests and ephemeral servers.

use anyhow::anyhow;
use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::error::Result;
use crate::index::VectorIndex;

use super::IndexStore;

#[derive(Default)]
pub struct MemoryIndexStore {
    current: RwLock<Option<Arc<VectorIndex>>>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    async fn replace(&self, index: VectorIndex) -> Result<Arc<VectorIndex>> {
        let published = Arc::new(index);
        let mut current = self
            .current
            .write()
            .map_err(|_| anyhow!("index lock poisoned"))?;
        *current = Some(published.clone());
        Ok(published)
    }

    async fn load(&self) -> Result<Option<Arc<VectorIndex>>> {
        let current = self
            .current
            .read()
            .map_err(|_| anyhow!("index lock poisoned"))?;
        Ok(current.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashProvider;

    async fn build(texts: &[&str]) -> VectorIndex {
        let provider = HashProvider::new(32).unwrap();
        let texts: Vec<String> = texts.iter().map(|s| s.to_string()).collect();
        VectorIndex::build(&provider, &texts, 8).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_loads_none() {
        let store = MemoryIndexStore::new();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_swaps_whole_generation() {
        let store = MemoryIndexStore::new();
        let first = store.replace(build(&["old one", "old two"]).await).await.unwrap();
        let held = store.load().await.unwrap().unwrap();
        assert_eq!(held.generation(), first.generation());

        let second = store.replace(build(&["new"]).await).await.unwrap();
        let now = store.load().await.unwrap().unwrap();
        assert_eq!(now.generation(), second.generation());
        assert_eq!(now.len(), 1);

        // A reader holding the previous generation still sees it intact.
        assert_eq!(held.len(), 2);
        assert!(held.chunks().iter().all(|c| c.text.starts_with("old")));
    }
}
