//! In-memory storage backend for testing.

use crate::error::{ErrorKind, Result};
use crate::path::within;
use async_trait::async_trait;
use exn::OptionExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

use crate::StorageBackend;

/// In-memory storage backend for testing.
///
/// Files are stored in a `HashMap` behind a [`RwLock`], so all trait methods
/// can operate on `&self` without external synchronisation. Its root is a
/// virtual `/mock/<name>` directory so that absolute paths handed out by
/// [`locate()`](StorageBackend::locate) resolve back into the map.
///
/// # Examples
///
/// ```
/// use thumbs_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MockBackend::with_files([
///     ("2024/IMG_0042.jpg", b"jpeg..."),
/// ]);
/// assert!(backend.exists(Path::new("2024/IMG_0042.jpg")).await?);
/// assert!(backend.exists(Path::new("/mock/mock/2024/IMG_0042.jpg")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    root: PathBuf,
    storage: RwLock<HashMap<PathBuf, Vec<u8>>>,
}

impl MockBackend {
    /// Create a mock backend pre-populated with files.
    ///
    /// Panics if any path fails validation (e.g. path traversal). If test
    /// setup is wrong, then test should not pass.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let mut map = HashMap::new();
        for (path, data) in files {
            let path = path.into();
            let Ok(validated) = crate::validate_path(&path) else {
                // The panic here is DELIBERATE. MockBackend is intended to be
                // used in tests; panics are expected. There is no error result.
                panic!("MockBackend::with_files: invalid path {}", path.display());
            };
            map.insert(validated, data.into());
        }
        Self {
            name: "mock".to_string(),
            root: PathBuf::from("/mock/mock"),
            storage: RwLock::new(map),
        }
    }

    /// Change the name (and with it, the virtual root) of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self.root = PathBuf::from("/mock").join(&self.name);
        self
    }

    /// Remove a file behind the back of whoever holds a path to it, the way an
    /// external process deleting a file on disk would.
    pub async fn remove(&self, path: impl AsRef<Path>) -> bool {
        let Ok(path) = within(&self.root, path) else {
            return false;
        };
        self.storage.write().await.remove(&path).is_some()
    }

    /// Number of files currently stored.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let files: [(&str, &str); 0] = [];
        Self::with_files(files)
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn root(&self) -> &Path {
        &self.root
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = within(&self.root, path)?;
        Ok(self.storage.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = within(&self.root, path)?;
        self.storage.read().await.get(&path).cloned().ok_or_raise(|| ErrorKind::NotFound(path.clone()))
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = within(&self.root, path)?;
        self.storage.write().await.insert(path, data.to_vec());
        Ok(())
    }
}
