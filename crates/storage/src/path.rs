//! Path validation and security utilities.
//!
//! Storage paths are relative to a backend root. Index records and renderer
//! output may also hand us absolute paths, which are accepted as long as they
//! point inside the root.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path for security and correctness.
/// Ensures that paths don't escape the storage root (no `..` traversal).
///
/// > **Note:** This does **not** normalize backslashes, non-UTF8 bytes, or
/// >           platform-specific weirdness. Null bytes are explicitly rejected.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use thumbs_storage::validate_path;
/// assert!(validate_path("2024/05/IMG_0042.jpg").is_ok());
/// assert!(validate_path("a/../IMG_0042.jpg").is_ok()); // (never leaves root)
/// assert!(validate_path("../etc/passwd").is_err());
/// assert!(validate_path("a\0b").is_err());
/// assert_eq!(
///     validate_path("wrong/.././2024//IMG_0042.jpg/").unwrap(),
///     Path::new("2024/IMG_0042.jpg")
/// );
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let mut components = Vec::new();
    for component in path.as_ref().components() {
        match component {
            Component::Normal(s) => {
                // Null bytes pass through Path::components() on Unix but cause
                // truncation in C-based syscalls.
                if s.as_encoded_bytes().contains(&0) {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
                components.push(s)
            },
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf()));
                }
            },
        }
    }
    match components.is_empty() {
        true => exn::bail!(ErrorKind::InvalidPath(path.as_ref().to_path_buf())),
        false => Ok(components.into_iter().collect()),
    }
}

/// Validate a path that is either relative to `root`, or absolute and inside
/// `root`. Returns the root-relative form.
pub(crate) fn within(root: &Path, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if !path.is_absolute() {
        return validate(path);
    }
    match path.strip_prefix(root) {
        Ok(relative) => validate(relative),
        Err(_) => exn::bail!(ErrorKind::InvalidPath(path.to_path_buf())),
    }
}
