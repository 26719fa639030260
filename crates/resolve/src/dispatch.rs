//! Generation dispatch.

use exn::ResultExt;
use std::path::{Path, PathBuf};
use thumbs_index::FileRecord;
use thumbs_render::Renderer;

use crate::error::{ErrorKind, Result};
use crate::sizes::SizeClass;

fn non_empty(path: PathBuf, hash: &str, size: &str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        tracing::error!(hash, size, "Renderer reported success without an artifact path");
        exn::bail!(ErrorKind::EmptyRenderResult);
    }
    Ok(path)
}

/// Render `size` for `record` from its `source`.
///
/// Uncached classes, and every class when `regenerate` is set, render from the
/// source file. Everything else reuses an existing artifact when there is one.
#[tracing::instrument(level = "debug", skip_all, fields(hash = %record.hash, size = size.name))]
pub async fn render(
    renderer: &dyn Renderer,
    source: &Path,
    record: &FileRecord,
    size: &SizeClass,
    regenerate: bool,
) -> Result<PathBuf> {
    let (hash, width, height, options) = (&record.hash, size.width, size.height, size.options);
    let path = if size.uncached || regenerate {
        renderer.from_source(source, hash, width, height, record.orientation, options).await
    } else {
        renderer.from_cache(source, hash, width, height, record.orientation, options).await
    }
    .or_raise(|| ErrorKind::RenderFailure)?;
    non_empty(path, hash, size.name)
}

/// Cut `area` out of the already-rendered crop source of `hash`.
#[tracing::instrument(level = "debug", skip(renderer, size), fields(size = size.name))]
pub async fn crop(renderer: &dyn Renderer, hash: &str, size: &SizeClass, area: &str) -> Result<PathBuf> {
    let path = renderer.crop(hash, size.width, size.height, area).await.or_raise(|| ErrorKind::RenderFailure)?;
    non_empty(path, hash, size.name)
}
