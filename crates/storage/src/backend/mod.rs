//! Storage backend trait and implementations.
//!
//! This module defines the `StorageBackend` trait, which provides a unified
//! interface for the storage operations the thumbnail pipeline needs: probing
//! for files, reading sources, and persisting rendered artifacts.

mod local;
#[cfg(feature = "mock")]
mod mock;

pub use self::local::LocalBackend;
#[cfg(feature = "mock")]
pub use self::mock::MockBackend;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Unified interface for storage backends.
///
/// # Path Handling
/// Paths are either relative to the backend root, or absolute paths located
/// inside it (as returned by [`locate()`](Self::locate)). Anything else is
/// rejected with [`InvalidPath`](crate::error::ErrorKind::InvalidPath).
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use thumbs_storage::{backend::StorageBackend, error::Result};
///
/// async fn artifact_len(backend: &dyn StorageBackend) -> Result<usize> {
///     let path = Path::new("a/b/c/abcdef_720x720_fit.jpg");
///     if backend.exists(path).await? {
///         Ok(backend.read(path).await?.len())
///     } else {
///         Ok(0)
///     }
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Name of the configured backend (name taken from the configuration
    /// object key). Used for logging only.
    fn name(&self) -> &str;

    /// Absolute root directory of the backend.
    fn root(&self) -> &Path;

    /// Resolve a storage path to the absolute path a caller can stream from.
    ///
    /// Does not check that the file exists.
    fn locate(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root().join(crate::path::within(self.root(), path)?))
    }

    /// Check if a file exists.
    ///
    /// Always reflects the current state of storage; nothing is cached.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// # use thumbs_storage::{backend::StorageBackend, error::Result};
    /// # async fn example(backend: &dyn StorageBackend) -> Result<()> {
    /// if backend.exists(Path::new("2024/IMG_0042.jpg")).await? {
    ///     println!("File exists!");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn exists(&self, path: &Path) -> Result<bool>;

    /// Read file contents.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the file
    /// does not exist.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write file contents.
    ///
    /// Creates a new file or overwrites an existing file. Parent directories
    /// are created as needed. Concurrent writers of the same path are
    /// last-writer-wins.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;
}
