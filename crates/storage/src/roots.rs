//! Named storage roots.
//!
//! Index records name the root their file lives under (`/` for originals,
//! `sidecar` for generated companions, and so on). [`Roots`] maps those names
//! onto configured backends.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::BackendHandle;
use crate::error::{ErrorKind, Result};

/// Root name used by index records for original files.
pub const ORIGINALS: &str = "/";

#[derive(Clone, Default)]
pub struct Roots {
    backends: BTreeMap<String, BackendHandle>,
}

impl Roots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under a root name, replacing any previous one.
    pub fn with(mut self, name: impl Into<String>, backend: BackendHandle) -> Self {
        self.insert(name, backend);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, backend: BackendHandle) {
        let name = name.into();
        tracing::debug!(root = %name, backend = backend.name(), "Storage root registered");
        self.backends.insert(name, backend);
    }

    /// Look up the backend for a root name. An empty name means originals.
    pub fn get(&self, name: &str) -> Result<&BackendHandle> {
        let key = if name.is_empty() { ORIGINALS } else { name };
        match self.backends.get(key) {
            Some(backend) => Ok(backend),
            None => exn::bail!(ErrorKind::UnknownRoot(key.to_string())),
        }
    }

    /// Absolute path of a file under a named root.
    pub fn locate(&self, root: &str, path: &Path) -> Result<PathBuf> {
        self.get(root)?.locate(path)
    }

    /// Whether a file under a named root is currently present.
    pub async fn exists(&self, root: &str, path: &Path) -> Result<bool> {
        self.get(root)?.exists(path).await
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.backends.keys().map(String::as_str)
    }
}

impl fmt::Debug for Roots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.backends.iter().map(|(name, backend)| (name, backend.root())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LocalBackend;
    use std::sync::Arc;

    fn roots() -> (tempfile::TempDir, tempfile::TempDir, Roots) {
        let originals = tempfile::tempdir().unwrap();
        let sidecar = tempfile::tempdir().unwrap();
        let roots = Roots::new()
            .with(ORIGINALS, Arc::new(LocalBackend::new("originals", originals.path()).unwrap()))
            .with("sidecar", Arc::new(LocalBackend::new("sidecar", sidecar.path()).unwrap()));
        (originals, sidecar, roots)
    }

    #[test]
    fn test_get_known_and_unknown() {
        let (_o, _s, roots) = roots();
        assert_eq!(roots.get("/").unwrap().name(), "originals");
        assert_eq!(roots.get("").unwrap().name(), "originals");
        assert_eq!(roots.get("sidecar").unwrap().name(), "sidecar");
        let Err(err) = roots.get("import") else {
            panic!("unknown root resolved");
        };
        assert!(matches!(&*err, ErrorKind::UnknownRoot(name) if name == "import"));
        assert_eq!(roots.names().collect::<Vec<_>>(), vec!["/", "sidecar"]);
    }

    #[test]
    fn test_locate() {
        let (originals, sidecar, roots) = roots();
        assert_eq!(
            roots.locate("/", Path::new("2024/IMG_0042.jpg")).unwrap(),
            originals.path().join("2024/IMG_0042.jpg")
        );
        assert_eq!(
            roots.locate("sidecar", Path::new("2024/IMG_0042.jpg")).unwrap(),
            sidecar.path().join("2024/IMG_0042.jpg")
        );
        assert!(roots.locate("/", Path::new("../IMG_0042.jpg")).is_err());
    }

    #[tokio::test]
    async fn test_exists() {
        let (originals, _s, roots) = roots();
        assert!(!roots.exists("/", Path::new("IMG_0001.jpg")).await.unwrap());
        std::fs::write(originals.path().join("IMG_0001.jpg"), b"jpeg").unwrap();
        assert!(roots.exists("/", Path::new("IMG_0001.jpg")).await.unwrap());
        assert!(!roots.exists("sidecar", Path::new("IMG_0001.jpg")).await.unwrap());
        assert!(roots.exists("nope", Path::new("IMG_0001.jpg")).await.is_err());
    }
}
