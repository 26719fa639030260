//! Request resolution.

use exn::ResultExt;
use std::path::PathBuf;
use thumbs_index::{DownloadName, IndexHandle};
use thumbs_render::RendererHandle;
use thumbs_storage::{BackendHandle, Roots};
use tokio_util::task::TaskTracker;

use crate::cache::{CacheEntry, RequestCache};
use crate::error::{Error, ErrorKind, Result};
use crate::key::{NAMESPACE, cache_key};
use crate::response::{Delivery, Outcome, Resolution};
use crate::sizes::{SizeClass, SizeRegistry};
use crate::{dispatch, fallback};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbRequest {
    pub hash: String,
    pub size: String,
    pub download: bool,
}
impl ThumbRequest {
    pub fn new(hash: impl Into<String>, size: impl Into<String>) -> Self {
        Self { hash: hash.into(), size: size.into(), download: false }
    }

    pub fn download(mut self) -> Self {
        self.download = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropRequest {
    pub hash: String,
    pub size: String,
    /// Crop area identifier, passed through to the renderer.
    pub area: String,
    pub download: bool,
}
impl CropRequest {
    pub fn new(hash: impl Into<String>, size: impl Into<String>, area: impl Into<String>) -> Self {
        Self { hash: hash.into(), size: size.into(), area: area.into(), download: false }
    }

    pub fn download(mut self) -> Self {
        self.download = true;
        self
    }
}

/// Process-wide resolution settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
    /// Render uncached classes on request, and always render from source.
    pub render_uncached: bool,
    pub download_name: DownloadName,
}

/// Resolves thumbnail requests to a file to stream or a placeholder.
///
/// Resolution never fails: every error is logged and answered with the
/// placeholder its kind maps to. Index bookkeeping triggered by a missing
/// source runs in the background; [`drain()`](Self::drain) waits for it.
pub struct Resolver {
    sizes: SizeRegistry,
    cache: RequestCache,
    index: IndexHandle,
    thumbs: BackendHandle,
    roots: Roots,
    renderer: RendererHandle,
    policy: Policy,
    tasks: TaskTracker,
}

impl Resolver {
    /// `thumbs` is the store the renderer writes artifacts into; `roots`
    /// holds the storage roots index records refer to.
    pub fn new(
        sizes: SizeRegistry,
        cache: RequestCache,
        index: IndexHandle,
        thumbs: BackendHandle,
        roots: Roots,
        renderer: RendererHandle,
        policy: Policy,
    ) -> Self {
        Self { sizes, cache, index, thumbs, roots, renderer, policy, tasks: TaskTracker::new() }
    }

    pub fn cache(&self) -> &RequestCache {
        &self.cache
    }

    #[tracing::instrument(skip(self), fields(hash = %request.hash, size = %request.size))]
    pub async fn resolve(&self, request: &ThumbRequest) -> Resolution {
        match self.try_resolve(request).await {
            Ok(resolution) => resolution,
            Err(e) => Self::absorb(e),
        }
    }

    #[tracing::instrument(skip(self), fields(hash = %request.hash, size = %request.size, area = %request.area))]
    pub async fn resolve_crop(&self, request: &CropRequest) -> Resolution {
        match self.try_resolve_crop(request).await {
            Ok(resolution) => resolution,
            Err(e) => Self::absorb(e),
        }
    }

    /// Wait for background index bookkeeping to finish.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    fn absorb(e: Error) -> Resolution {
        let placeholder = e.placeholder();
        if e.is_retryable() || matches!(&*e, ErrorKind::EmptyRenderResult) {
            tracing::error!(error = ?e, ?placeholder, "Serving placeholder");
        } else {
            tracing::debug!(error = %e, ?placeholder, "Serving placeholder");
        }
        Resolution::placeholder(placeholder)
    }

    fn size(&self, name: &str) -> Result<&SizeClass> {
        match self.sizes.resolve(name) {
            Some(size) => Ok(size),
            None => exn::bail!(ErrorKind::InvalidSizeClass(name.to_string())),
        }
    }

    /// The cached entry for `key`, if its artifact is still on storage.
    async fn cached(&self, key: &str) -> Result<Option<CacheEntry>> {
        let Some(entry) = self.cache.get(key) else {
            return Ok(None);
        };
        if self.thumbs.exists(&entry.path).await.or_raise(|| ErrorKind::Storage)? {
            return Ok(Some(entry));
        }
        tracing::debug!(key, path = %entry.path.display(), "Cached artifact vanished");
        self.cache.invalidate(key);
        Ok(None)
    }

    /// The precomputed artifact for `size`, if it has already been rendered.
    ///
    /// Any failure here is only a missed shortcut; the index decides.
    async fn existing(&self, hash: &str, size: &SizeClass) -> Option<PathBuf> {
        let path = match self.renderer.locate(hash, size.width, size.height, size.options) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "No artifact name for request");
                return None;
            },
        };
        match self.thumbs.exists(&path).await {
            Ok(true) => Some(path),
            Ok(false) => None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Artifact probe failed");
                None
            },
        }
    }

    async fn try_resolve(&self, request: &ThumbRequest) -> Result<Resolution> {
        let requested = self.size(&request.size)?;
        let size = fallback::effective_size(&self.sizes, requested, self.policy.render_uncached)?;
        let key = cache_key(NAMESPACE, &request.hash, size.name);

        if let Some(entry) = self.cached(&key).await? {
            tracing::debug!(key, "Request cache hit");
            let delivery = if request.download { Delivery::Attachment(entry.share_name) } else { Delivery::Inline };
            return Ok(Resolution::file(Outcome::Cached, entry.path, delivery));
        }

        if !request.download
            && !size.uncached
            && let Some(path) = self.existing(&request.hash, size).await
        {
            return Ok(Resolution::file(Outcome::Existing, path, Delivery::Inline));
        }

        let record = fallback::source_record(&self.index, &request.hash).await?;
        let source = fallback::verify_source(&self.roots, &self.index, &self.tasks, &record).await?;

        if size.exceeds_limit && !request.download {
            tracing::debug!(source = %source.display(), "Size above render limit, serving original");
            return Ok(Resolution::file(Outcome::Original, source, Delivery::Inline));
        }

        let path = dispatch::render(self.renderer.as_ref(), &source, &record, size, self.policy.render_uncached).await?;
        self.cache.set(key, CacheEntry { path: path.clone(), share_name: record.share_name() });
        let delivery = if request.download {
            Delivery::Attachment(record.download_name(self.policy.download_name))
        } else {
            Delivery::Inline
        };
        Ok(Resolution::file(Outcome::Rendered, path, delivery))
    }

    async fn try_resolve_crop(&self, request: &CropRequest) -> Result<Resolution> {
        let size = self.size(&request.size)?;
        if !size.is_crop() {
            exn::bail!(ErrorKind::InvalidCropSize(size.name.to_string()));
        }
        let path = dispatch::crop(self.renderer.as_ref(), &request.hash, size, &request.area).await?;
        let delivery = if request.download { Delivery::Attachment(size.jpeg_name()) } else { Delivery::Inline };
        Ok(Resolution::file(Outcome::Rendered, path, delivery))
    }
}
