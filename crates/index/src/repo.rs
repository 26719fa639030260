//! Repository for items and their file records.
//!
//! Files can't exist without their owning item; an item whose files have all
//! gone missing is soft-deleted rather than removed, so that its history and
//! any rows referencing it survive.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{FileRecord, FileRow, Item, ItemRow, NewFile};
use exn::{OptionExt, ResultExt};
use sqlx::SqlitePool;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

/// Outcome of [`Repository::mark_missing_and_prune()`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pruned {
    /// The file record was flipped to missing by this call.
    pub marked: bool,
    /// The owning item was deleted by this call.
    pub item_deleted: bool,
}

#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    read_only: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), read_only: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    ///
    /// A read-only repository answers lookups but turns every mutation into a
    /// logged no-op.
    pub fn new(pool: SqlitePool, read_only: bool) -> Self {
        Self { pool, read_only }
    }

    fn sqlx_hates_paths(path: impl AsRef<Path>) -> Result<String> {
        Ok(path.as_ref().to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string())
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert an item, or update the title and capture time of an existing one.
    pub async fn upsert_item(&self, item: &Item) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        sqlx::query(include_str!("../queries/upsert_item.sql"))
            .bind(&item.uid)
            .bind(&item.title)
            .bind(item.taken_at.unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Insert a file, or replace the record at the same `(root, name)`.
    ///
    /// Replacing a record clears its missing flag. Returns the record id.
    pub async fn upsert_file(&self, file: &NewFile) -> Result<i64> {
        if self.read_only {
            return Ok(0);
        }
        let id: i64 = sqlx::query_scalar(include_str!("../queries/upsert_file.sql"))
            .bind(&file.item_uid)
            .bind(&file.hash)
            .bind(&file.root)
            .bind(Self::sqlx_hates_paths(&file.name)?)
            .bind(file.original_name.as_deref().unwrap_or_default())
            .bind(file.format.as_str())
            .bind(i64::from(file.orientation))
            .bind(file.primary)
            .bind(file.error.as_deref().unwrap_or_default())
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(id)
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Canonical file record for a content hash.
    ///
    /// When several files share the hash, the item's primary file wins, then
    /// the oldest record.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_by_hash(&self, hash: &str) -> Result<Option<FileRecord>> {
        let row: Option<FileRow> = sqlx::query_as(include_str!("../queries/find_by_hash.sql"))
            .bind(hash)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(FileRecord::try_from).transpose()
    }

    /// Best renderable, present file of an item: primary first, then oldest.
    #[instrument(level = "debug", skip(self))]
    pub async fn find_by_owner(&self, item_uid: &str) -> Result<Option<FileRecord>> {
        let rows: Vec<FileRow> = sqlx::query_as(include_str!("../queries/list_by_owner.sql"))
            .bind(item_uid)
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for row in rows {
            let record = FileRecord::try_from(row)?;
            if record.is_renderable() {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    pub async fn get_item(&self, uid: &str) -> Result<Option<Item>> {
        let row: Option<ItemRow> = sqlx::query_as(include_str!("../queries/get_item.sql"))
            .bind(uid)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Item::try_from).transpose()
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Mark a file record missing, then soft-delete its owning item if none of
    /// the item's files remain present.
    ///
    /// Both steps run in one transaction. Repeating the call (or racing it
    /// against itself) is a no-op reporting `marked: false`.
    #[instrument(level = "debug", skip_all, fields(id = record.id, item = %record.item_uid))]
    pub async fn mark_missing_and_prune(&self, record: &FileRecord) -> Result<Pruned> {
        if self.read_only {
            tracing::info!(file = %record.name.display(), "Read-only index, not marking file missing");
            return Ok(Pruned::default());
        }
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let marked = sqlx::query(include_str!("../queries/mark_missing.sql"))
            .bind(record.id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected()
            > 0;
        let present: i64 = sqlx::query_scalar(include_str!("../queries/count_present.sql"))
            .bind(&record.item_uid)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let item_deleted = if present == 0 {
            sqlx::query(include_str!("../queries/delete_item.sql"))
                .bind(UtcDateTime::now().unix_timestamp())
                .bind(&record.item_uid)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?
                .rows_affected()
                > 0
        } else {
            false
        };
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        if marked {
            tracing::info!(file = %record.name.display(), "File marked missing");
        }
        if item_deleted {
            tracing::info!("All files missing, item deleted");
        }
        Ok(Pruned { marked, item_deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileFormat;

    async fn repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        Repository::from(&db)
    }

    async fn seed_item(repo: &Repository, uid: &str) {
        repo.upsert_item(&Item::new(uid, "Lake Bled", UtcDateTime::UNIX_EPOCH)).await.unwrap();
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "2024/IMG_1.jpg", FileFormat::Jpeg).with_orientation(6))
            .await
            .unwrap();
        let found = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        assert_eq!(found.name, Path::new("2024/IMG_1.jpg"));
        assert_eq!(found.orientation, 6);
        assert_eq!(found.item_title, "Lake Bled");
        assert_eq!(found.root, "/");
        assert!(repo.find_by_hash("bbbb2222").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_hash_prefers_primary() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "copy/IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "2024/IMG_1.jpg", FileFormat::Jpeg).primary())
            .await
            .unwrap();
        let found = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        assert_eq!(found.name, Path::new("2024/IMG_1.jpg"));
        assert!(found.primary);
    }

    #[tokio::test]
    async fn test_find_by_owner_skips_unrenderable_and_missing() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "raw00001", "IMG_1.dng", FileFormat::Raw).primary()).await.unwrap();
        let gone = repo.upsert_file(&NewFile::new("item-1", "jpg00001", "IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();
        repo.upsert_file(&NewFile::new("item-1", "png00001", "IMG_1.png", FileFormat::Png)).await.unwrap();
        let record = repo.find_by_hash("jpg00001").await.unwrap().unwrap();
        assert_eq!(record.id, gone);
        repo.mark_missing_and_prune(&record).await.unwrap();

        let sibling = repo.find_by_owner("item-1").await.unwrap().unwrap();
        assert_eq!(sibling.hash, "png00001");
        assert!(repo.find_by_owner("item-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_missing_and_prune() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();
        repo.upsert_file(&NewFile::new("item-1", "bbbb2222", "IMG_1.png", FileFormat::Png)).await.unwrap();
        let first = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        let second = repo.find_by_hash("bbbb2222").await.unwrap().unwrap();

        let pruned = repo.mark_missing_and_prune(&first).await.unwrap();
        assert_eq!(pruned, Pruned { marked: true, item_deleted: false });
        assert!(repo.find_by_hash("aaaa1111").await.unwrap().unwrap().missing);
        assert!(!repo.get_item("item-1").await.unwrap().unwrap().is_deleted());

        // Last remaining file takes the item with it.
        let pruned = repo.mark_missing_and_prune(&second).await.unwrap();
        assert_eq!(pruned, Pruned { marked: true, item_deleted: true });
        assert!(repo.get_item("item-1").await.unwrap().unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_mark_missing_and_prune_is_idempotent() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();
        let record = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        assert_eq!(repo.mark_missing_and_prune(&record).await.unwrap(), Pruned { marked: true, item_deleted: true });
        assert_eq!(repo.mark_missing_and_prune(&record).await.unwrap(), Pruned::default());
        let deleted_at = repo.get_item("item-1").await.unwrap().unwrap().deleted_at;
        assert_eq!(repo.mark_missing_and_prune(&record).await.unwrap(), Pruned::default());
        assert_eq!(repo.get_item("item-1").await.unwrap().unwrap().deleted_at, deleted_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_prunes_mark_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("index.db")).await.unwrap();
        let repo = Repository::from(&db);
        seed_item(&repo, "item-1").await;
        repo.upsert_file(&NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();
        let record = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();

        let mut prunes = tokio::task::JoinSet::new();
        for _ in 0..8 {
            let (repo, record) = (repo.clone(), record.clone());
            prunes.spawn(async move { repo.mark_missing_and_prune(&record).await.unwrap() });
        }
        let results = prunes.join_all().await;
        assert_eq!(results.iter().filter(|p| p.marked).count(), 1);
        assert_eq!(results.iter().filter(|p| p.item_deleted).count(), 1);
        assert!(repo.find_by_hash("aaaa1111").await.unwrap().unwrap().missing);
        assert!(repo.get_item("item-1").await.unwrap().unwrap().is_deleted());
        db.close().await;
    }

    #[tokio::test]
    async fn test_upsert_file_clears_missing_flag() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        let file = NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg);
        let id = repo.upsert_file(&file).await.unwrap();
        let record = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        repo.mark_missing_and_prune(&record).await.unwrap();
        assert_eq!(repo.upsert_file(&file).await.unwrap(), id);
        assert!(!repo.find_by_hash("aaaa1111").await.unwrap().unwrap().missing);
    }

    #[tokio::test]
    async fn test_read_only_skips_mutations() {
        let db = Database::connect_in_memory().await.unwrap();
        let writable = Repository::from(&db);
        seed_item(&writable, "item-1").await;
        writable.upsert_file(&NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg)).await.unwrap();

        let read_only = Repository::new(db.pool().clone(), true);
        let record = read_only.find_by_hash("aaaa1111").await.unwrap().unwrap();
        assert_eq!(read_only.mark_missing_and_prune(&record).await.unwrap(), Pruned::default());
        assert!(!writable.find_by_hash("aaaa1111").await.unwrap().unwrap().missing);
    }

    #[tokio::test]
    async fn test_stored_error_round_trips() {
        let repo = repo().await;
        seed_item(&repo, "item-1").await;
        repo.upsert_file(
            &NewFile::new("item-1", "aaaa1111", "IMG_1.jpg", FileFormat::Jpeg)
                .with_error("truncated jpeg")
                .with_original_name("holiday.jpg"),
        )
        .await
        .unwrap();
        let record = repo.find_by_hash("aaaa1111").await.unwrap().unwrap();
        assert_eq!(record.error.as_deref(), Some("truncated jpeg"));
        assert_eq!(record.original_name.as_deref(), Some("holiday.jpg"));
    }
}
