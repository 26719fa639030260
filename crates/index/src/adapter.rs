use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::models::FileRecord;
use crate::repo::{Pruned, Repository};

/// The slice of the index that thumbnail resolution depends on.
///
/// Lookups return `Ok(None)` when nothing matches; errors are reserved for
/// the index itself failing.
#[async_trait]
pub trait Index: Send + Sync {
    /// Canonical file record for a content hash.
    async fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>>;

    /// A renderable, present file belonging to the given item.
    async fn find_by_owner(&self, item_uid: &str) -> Result<Option<FileRecord>>;

    /// Mark the record missing, and delete its item once no file of the item
    /// remains present. Idempotent.
    async fn mark_missing_and_prune(&self, record: &FileRecord) -> Result<Pruned>;
}

pub type IndexHandle = Arc<dyn Index>;

#[async_trait]
impl Index for Repository {
    async fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>> {
        Repository::find_by_hash(self, hash).await
    }

    async fn find_by_owner(&self, item_uid: &str) -> Result<Option<FileRecord>> {
        Repository::find_by_owner(self, item_uid).await
    }

    async fn mark_missing_and_prune(&self, record: &FileRecord) -> Result<Pruned> {
        Repository::mark_missing_and_prune(self, record).await
    }
}
