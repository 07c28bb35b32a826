//! Storage of the live [`VectorIndex`].
//!
//! A storage location holds at most one index. [`IndexStore::replace`]
//! publishes a new generation atomically: readers calling
//! [`IndexStore::load`] see either the complete old index or the complete
//! new one, never chunks from both. Published indexes are shared as
//! `Arc<VectorIndex>`, so a reader holding the old generation keeps a
//! consistent view while a replace happens.
//!
//! | Implementation | Backing | Survives restart |
//! |----------------|---------|------------------|
//! | [`MemoryIndexStore`] | `RwLock<Option<Arc<_>>>` pointer swap | no |
//! | [`SqliteIndexStore`] | one SQLite transaction, then pointer swap | yes |

pub mod memory;
pub mod sqlite;

pub use memory::MemoryIndexStore;
pub use sqlite::SqliteIndexStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::index::VectorIndex;

#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Atomically replace whatever index is stored with `index`.
    async fn replace(&self, index: VectorIndex) -> Result<Arc<VectorIndex>>;

    /// The current index, or `None` if no document has been ingested.
    async fn load(&self) -> Result<Option<Arc<VectorIndex>>>;
}
