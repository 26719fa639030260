//! Substitution rules applied before anything is rendered.

use exn::ResultExt;
use std::path::PathBuf;
use thumbs_index::{FileRecord, IndexHandle};
use thumbs_storage::Roots;
use tokio_util::task::TaskTracker;

use crate::error::{ErrorKind, Result};
use crate::sizes::{SizeClass, SizeRegistry};

/// Size class to actually serve for a requested one.
///
/// Uncached classes are redirected to the largest precomputed class that fits
/// the precached dimension, unless uncached classes may be rendered on
/// request.
pub fn effective_size<'a>(sizes: &'a SizeRegistry, size: &'a SizeClass, render_uncached: bool) -> Result<&'a SizeClass> {
    if !size.uncached || render_uncached {
        return Ok(size);
    }
    match sizes.find_precomputed(sizes.precached()) {
        Some(substitute) => {
            tracing::debug!(requested = size.name, effective = substitute.name, "Uncached size redirected");
            Ok(substitute)
        },
        None => exn::bail!(ErrorKind::InvalidSizePolicy(size.name.to_string())),
    }
}

/// File record whose source will be rendered for a hash.
///
/// A hash indexed to a non-renderable file (a RAW, a video) falls back to a
/// renderable sibling of the same item.
pub async fn source_record(index: &IndexHandle, hash: &str) -> Result<FileRecord> {
    let Some(primary) = index.find_by_hash(hash).await.or_raise(|| ErrorKind::Index)? else {
        exn::bail!(ErrorKind::RecordNotFound(hash.to_string()));
    };
    let record = if primary.is_renderable() {
        primary
    } else {
        match index.find_by_owner(&primary.item_uid).await.or_raise(|| ErrorKind::Index)? {
            Some(sibling) => {
                tracing::debug!(hash, format = %primary.format, sibling = %sibling.name.display(), "Using renderable sibling");
                sibling
            },
            None => exn::bail!(ErrorKind::UnsupportedFormat(hash.to_string())),
        }
    };
    if let Some(error) = &record.error {
        exn::bail!(ErrorKind::RecordBroken(error.clone()));
    }
    Ok(record)
}

/// Absolute path of the record's source file, if it is still on storage.
///
/// An absent source is flagged in the index in the background; the caller
/// receives [`SourceFileMissing`](ErrorKind::SourceFileMissing) immediately.
pub async fn verify_source(roots: &Roots, index: &IndexHandle, tasks: &TaskTracker, record: &FileRecord) -> Result<PathBuf> {
    // An unconfigured root says nothing about the file, so it is never marked missing.
    let path = roots.locate(&record.root, &record.name).or_raise(|| ErrorKind::Storage)?;
    if roots.exists(&record.root, &record.name).await.or_raise(|| ErrorKind::Storage)? {
        return Ok(path);
    }
    tracing::warn!(hash = %record.hash, path = %path.display(), "Source file missing");
    let index = index.clone();
    let missing = record.clone();
    tasks.spawn(async move {
        if let Err(e) = index.mark_missing_and_prune(&missing).await {
            tracing::error!(hash = %missing.hash, error = ?e, "Failed to mark file missing");
        }
    });
    exn::bail!(ErrorKind::SourceFileMissing(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingIndex, Fixture, taken_at};
    use thumbs_index::{FileFormat, Item, NewFile};
    use std::path::Path;
    use std::sync::Arc;

    #[test]
    fn test_effective_size() {
        let sizes = SizeRegistry::default();
        let tile = sizes.resolve("tile_224").unwrap();
        assert_eq!(effective_size(&sizes, tile, false).unwrap().name, "tile_224");

        let big = sizes.resolve("fit_4096").unwrap();
        assert_eq!(effective_size(&sizes, big, false).unwrap().name, "fit_2048");
        assert_eq!(effective_size(&sizes, big, true).unwrap().name, "fit_4096");
    }

    #[test]
    fn test_effective_size_without_substitute() {
        // Nothing fits under a 2px precached dimension.
        let sizes = SizeRegistry::new(2, 7680);
        let tile = sizes.resolve("tile_50").unwrap();
        let err = effective_size(&sizes, tile, false).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidSizePolicy(name) if name == "tile_50"));
        assert!(effective_size(&sizes, tile, true).is_ok());
    }

    #[tokio::test]
    async fn test_source_record() {
        let fixture = Fixture::new().await;
        fixture.photo("item1", "aaaa1111", "2024/lake.jpg").await;
        let record = source_record(&fixture.index, "aaaa1111").await.unwrap();
        assert_eq!(record.name, Path::new("2024/lake.jpg"));

        let err = source_record(&fixture.index, "ffff0000").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn test_source_record_sibling() {
        let fixture = Fixture::new().await;
        fixture.raw("item1", "bbbb2222", "2024/lake.cr2").await;
        fixture.photo("item1", "cccc3333", "2024/lake.jpg").await;
        let record = source_record(&fixture.index, "bbbb2222").await.unwrap();
        assert_eq!(record.hash, "cccc3333");

        fixture.raw("item2", "dddd4444", "2024/alone.cr2").await;
        let err = source_record(&fixture.index, "dddd4444").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_source_record_broken() {
        let fixture = Fixture::new().await;
        fixture.broken("item1", "eeee5555", "2024/truncated.jpg", "unexpected end of file").await;
        let err = source_record(&fixture.index, "eeee5555").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RecordBroken(e) if e == "unexpected end of file"));
    }

    #[tokio::test]
    async fn test_source_record_index_failure() {
        let index: IndexHandle = Arc::new(FailingIndex);
        let err = source_record(&index, "aaaa1111").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Index));
    }

    #[tokio::test]
    async fn test_verify_source() {
        let fixture = Fixture::new().await;
        fixture.photo("item1", "aaaa1111", "2024/lake.jpg").await;
        let record = source_record(&fixture.index, "aaaa1111").await.unwrap();
        let tasks = TaskTracker::new();
        let path = verify_source(&fixture.roots, &fixture.index, &tasks, &record).await.unwrap();
        assert_eq!(path, Path::new("/mock/originals/2024/lake.jpg"));
        tasks.close();
        tasks.wait().await;
        assert!(fixture.index.find_by_hash("aaaa1111").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_verify_source_unknown_root_keeps_record() {
        let fixture = Fixture::new().await;
        fixture.repo.upsert_item(&Item::new("item1", "Lake Bled", taken_at())).await.unwrap();
        let file = NewFile::new("item1", "aaaa1111", "2024/lake.jpg", FileFormat::Jpeg).with_root("sidecar");
        fixture.repo.upsert_file(&file).await.unwrap();
        let record = source_record(&fixture.index, "aaaa1111").await.unwrap();

        let tasks = TaskTracker::new();
        let err = verify_source(&fixture.roots, &fixture.index, &tasks, &record).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Storage));
        assert_eq!(err.placeholder(), crate::response::Placeholder::Broken);
        tasks.close();
        tasks.wait().await;
        assert!(!fixture.index.find_by_hash("aaaa1111").await.unwrap().unwrap().missing);
        assert!(!fixture.repo.get_item("item1").await.unwrap().unwrap().is_deleted());
    }

    #[tokio::test]
    async fn test_verify_source_missing_prunes() {
        let fixture = Fixture::new().await;
        fixture.photo("item1", "aaaa1111", "2024/lake.jpg").await;
        let record = source_record(&fixture.index, "aaaa1111").await.unwrap();
        fixture.originals.remove("2024/lake.jpg").await;

        let tasks = TaskTracker::new();
        let err = verify_source(&fixture.roots, &fixture.index, &tasks, &record).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::SourceFileMissing(_)));
        tasks.close();
        tasks.wait().await;

        assert!(fixture.repo.get_item("item1").await.unwrap().unwrap().is_deleted());
        assert!(fixture.index.find_by_owner("item1").await.unwrap().is_none());
    }
}
