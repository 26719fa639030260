//! Shared fixtures for resolver tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use thumbs_index::{Database, FileFormat, FileRecord, Index, IndexHandle, Item, NewFile, Pruned, Repository};
use thumbs_render::{CropArea, ResampleOption, Renderer, artifact_name, crop_name, error as render};
use thumbs_storage::backend::{MockBackend, StorageBackend};
use thumbs_storage::{ORIGINALS, Roots};
use time::{Date, Month, Time, UtcDateTime};

pub(crate) const MAX: u32 = 7680;

pub(crate) fn taken_at() -> UtcDateTime {
    UtcDateTime::new(Date::from_calendar_date(2024, Month::May, 17).unwrap(), Time::from_hms(9, 30, 12).unwrap())
}

/// An in-memory index plus mock originals and thumbnail stores.
pub(crate) struct Fixture {
    _db: Database,
    pub(crate) repo: Repository,
    pub(crate) index: IndexHandle,
    pub(crate) originals: Arc<MockBackend>,
    pub(crate) thumbs: Arc<MockBackend>,
    pub(crate) roots: Roots,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        let originals = Arc::new(MockBackend::default().with_name("originals"));
        let thumbs = Arc::new(MockBackend::default().with_name("thumbs"));
        let roots = Roots::new().with(ORIGINALS, originals.clone());
        Self { _db: db, index: Arc::new(repo.clone()), repo, originals, thumbs, roots }
    }

    async fn add(&self, file: NewFile, on_disk: bool) {
        self.repo.upsert_item(&Item::new(&file.item_uid, "Lake Bled", taken_at())).await.unwrap();
        if on_disk {
            self.originals.write(&file.name, b"source").await.unwrap();
        }
        self.repo.upsert_file(&file).await.unwrap();
    }

    /// Indexed, renderable and present.
    pub(crate) async fn photo(&self, item: &str, hash: &str, name: &str) {
        self.add(NewFile::new(item, hash, name, FileFormat::Jpeg).with_original_name("DSC_0042.JPG"), true).await;
    }

    /// Indexed, present, but not renderable.
    pub(crate) async fn raw(&self, item: &str, hash: &str, name: &str) {
        self.add(NewFile::new(item, hash, name, FileFormat::Raw).primary(), true).await;
    }

    pub(crate) async fn broken(&self, item: &str, hash: &str, name: &str, error: &str) {
        self.add(NewFile::new(item, hash, name, FileFormat::Jpeg).with_error(error), true).await;
    }

    pub(crate) fn renderer(&self) -> Arc<CountingRenderer> {
        Arc::new(CountingRenderer::new(self.thumbs.clone()))
    }
}

/// Index whose every call fails.
pub(crate) struct FailingIndex;

#[async_trait]
impl Index for FailingIndex {
    async fn find_by_hash(&self, _hash: &str) -> thumbs_index::error::Result<Option<FileRecord>> {
        exn::bail!(thumbs_index::error::ErrorKind::Database)
    }

    async fn find_by_owner(&self, _item_uid: &str) -> thumbs_index::error::Result<Option<FileRecord>> {
        exn::bail!(thumbs_index::error::ErrorKind::Database)
    }

    async fn mark_missing_and_prune(&self, _record: &FileRecord) -> thumbs_index::error::Result<Pruned> {
        exn::bail!(thumbs_index::error::ErrorKind::Database)
    }
}

/// Renderer that writes placeholder bytes into a mock store and counts calls.
pub(crate) struct CountingRenderer {
    store: Arc<MockBackend>,
    pub(crate) from_source: AtomicUsize,
    pub(crate) from_cache: AtomicUsize,
    pub(crate) crops: AtomicUsize,
    /// Last orientation passed to a render call.
    pub(crate) orientation: AtomicUsize,
    fail: bool,
    empty: bool,
}

impl CountingRenderer {
    pub(crate) fn new(store: Arc<MockBackend>) -> Self {
        Self {
            store,
            from_source: AtomicUsize::new(0),
            from_cache: AtomicUsize::new(0),
            crops: AtomicUsize::new(0),
            orientation: AtomicUsize::new(0),
            fail: false,
            empty: false,
        }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Claims success without producing a path.
    pub(crate) fn empty(mut self) -> Self {
        self.empty = true;
        self
    }

    pub(crate) fn renders(&self) -> usize {
        self.from_source.load(Ordering::SeqCst) + self.from_cache.load(Ordering::SeqCst) + self.crops.load(Ordering::SeqCst)
    }

    async fn produce(&self, name: PathBuf) -> render::Result<PathBuf> {
        if self.fail {
            exn::bail!(render::ErrorKind::Decode);
        }
        if self.empty {
            return Ok(PathBuf::new());
        }
        self.store.write(&name, b"artifact").await.unwrap();
        Ok(self.store.locate(&name).unwrap())
    }
}

#[async_trait]
impl Renderer for CountingRenderer {
    fn locate(&self, hash: &str, width: u32, height: u32, options: &[ResampleOption]) -> render::Result<PathBuf> {
        Ok(self.store.root().join(artifact_name(hash, width, height, options, MAX)?))
    }

    async fn from_source(
        &self,
        _source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> render::Result<PathBuf> {
        self.from_source.fetch_add(1, Ordering::SeqCst);
        self.orientation.store(orientation.into(), Ordering::SeqCst);
        self.produce(artifact_name(hash, width, height, options, MAX)?).await
    }

    async fn from_cache(
        &self,
        _source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> render::Result<PathBuf> {
        self.from_cache.fetch_add(1, Ordering::SeqCst);
        self.orientation.store(orientation.into(), Ordering::SeqCst);
        self.produce(artifact_name(hash, width, height, options, MAX)?).await
    }

    async fn crop(&self, hash: &str, width: u32, height: u32, area: &str) -> render::Result<PathBuf> {
        self.crops.fetch_add(1, Ordering::SeqCst);
        let area: CropArea = area.parse()?;
        self.produce(crop_name(hash, width, height, &area, MAX)?).await
    }
}
