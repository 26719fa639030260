//! `image`-backed renderer writing artifacts into a storage backend.

use async_trait::async_trait;
use exn::ResultExt;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, ExtendedColorType, ImageFormat};
use std::io::Cursor;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use thumbs_storage::BackendHandle;
use thumbs_storage::error::ErrorKind as StorageErrorKind;
use tracing::instrument;

use crate::area::CropArea;
use crate::error::{ErrorKind, Result};
use crate::name::{artifact_name, crop_name};
use crate::options::{Filter, ResampleOption, method_of};
use crate::{CROP_SOURCE, Renderer};

/// Encoder and sampling settings shared by every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    /// Largest width or height the renderer will produce.
    pub max: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
    pub filter: Filter,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self { max: 7680, quality: 90, filter: Filter::default() }
    }
}

/// Renders JPEG and PNG sources with the `image` crate.
///
/// Decoding and encoding run on the blocking thread pool. Artifacts are
/// written to (and probed in) the store the renderer is constructed with.
pub struct ImageRenderer {
    store: BackendHandle,
    settings: RenderSettings,
}

impl ImageRenderer {
    pub fn new(store: BackendHandle, settings: RenderSettings) -> Self {
        Self { store, settings }
    }

    async fn read_source(source: &Path) -> Result<Vec<u8>> {
        match tokio::fs::read(source).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                exn::bail!(ErrorKind::SourceMissing(source.to_path_buf()))
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }

    /// Read an artifact out of the store, `None` if it isn't there.
    async fn read_artifact(&self, name: &Path) -> Result<Option<Vec<u8>>> {
        match self.store.read(name).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if matches!(e.deref(), StorageErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e).or_raise(|| ErrorKind::Storage),
        }
    }

    async fn persist(&self, name: &Path, bytes: &[u8]) -> Result<PathBuf> {
        self.store.write(name, bytes).await.or_raise(|| ErrorKind::Storage)?;
        self.store.locate(name).or_raise(|| ErrorKind::Storage)
    }

    async fn render(
        &self,
        source: &Path,
        name: &Path,
        (width, height): (u32, u32),
        orientation: u8,
        options: &[ResampleOption],
    ) -> Result<PathBuf> {
        let bytes = Self::read_source(source).await?;
        let settings = self.settings;
        let options = options.to_vec();
        let encoded =
            tokio::task::spawn_blocking(move || transform(&bytes, width, height, orientation, &options, &settings))
                .await
                .or_raise(|| ErrorKind::Task)??;
        let path = self.persist(name, &encoded).await?;
        tracing::debug!(artifact = %path.display(), bytes = encoded.len(), "Thumbnail rendered");
        Ok(path)
    }
}

#[async_trait]
impl Renderer for ImageRenderer {
    fn locate(&self, hash: &str, width: u32, height: u32, options: &[ResampleOption]) -> Result<PathBuf> {
        let name = artifact_name(hash, width, height, options, self.settings.max)?;
        self.store.locate(&name).or_raise(|| ErrorKind::Storage)
    }

    #[instrument(level = "debug", skip(self, options))]
    async fn from_source(
        &self,
        source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> Result<PathBuf> {
        let name = artifact_name(hash, width, height, options, self.settings.max)?;
        self.render(source, &name, (width, height), orientation, options).await
    }

    #[instrument(level = "debug", skip(self, options))]
    async fn from_cache(
        &self,
        source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> Result<PathBuf> {
        let name = artifact_name(hash, width, height, options, self.settings.max)?;
        if self.store.exists(&name).await.or_raise(|| ErrorKind::Storage)? {
            return self.store.locate(&name).or_raise(|| ErrorKind::Storage);
        }
        self.render(source, &name, (width, height), orientation, options).await
    }

    #[instrument(level = "debug", skip(self))]
    async fn crop(&self, hash: &str, width: u32, height: u32, area: &str) -> Result<PathBuf> {
        let area: CropArea = area.parse()?;
        let name = crop_name(hash, width, height, &area, self.settings.max)?;
        if self.store.exists(&name).await.or_raise(|| ErrorKind::Storage)? {
            return self.store.locate(&name).or_raise(|| ErrorKind::Storage);
        }
        let (source_width, source_height, source_options) = CROP_SOURCE;
        let source = artifact_name(hash, source_width, source_height, source_options, self.settings.max)?;
        let Some(bytes) = self.read_artifact(&source).await? else {
            exn::bail!(ErrorKind::SourceMissing(source));
        };
        let settings = self.settings;
        let encoded = tokio::task::spawn_blocking(move || cut(&bytes, &area, width, height, &settings))
            .await
            .or_raise(|| ErrorKind::Task)??;
        let path = self.persist(&name, &encoded).await?;
        tracing::debug!(artifact = %path.display(), %area, "Crop rendered");
        Ok(path)
    }
}

enum Anchor {
    Center,
    TopLeft,
    BottomRight,
}

fn filter_for(options: &[ResampleOption], settings: &RenderSettings) -> FilterType {
    if options.contains(&ResampleOption::NearestNeighbor) { FilterType::Nearest } else { settings.filter.into() }
}

/// Scale to cover `width`x`height`, then cut that box out at the anchor.
fn fill(image: DynamicImage, width: u32, height: u32, anchor: Anchor, filter: FilterType) -> DynamicImage {
    if let Anchor::Center = anchor {
        return image.resize_to_fill(width, height, filter);
    }
    let scale = f64::max(f64::from(width) / f64::from(image.width()), f64::from(height) / f64::from(image.height()));
    let scaled_width = ((f64::from(image.width()) * scale).round() as u32).max(width);
    let scaled_height = ((f64::from(image.height()) * scale).round() as u32).max(height);
    let scaled = image.resize_exact(scaled_width, scaled_height, filter);
    let (x, y) = match anchor {
        Anchor::TopLeft => (0, 0),
        _ => (scaled_width - width, scaled_height - height),
    };
    scaled.crop_imm(x, y, width, height)
}

fn resample(image: DynamicImage, width: u32, height: u32, options: &[ResampleOption], filter: FilterType) -> DynamicImage {
    match method_of(options) {
        ResampleOption::FillCenter | ResampleOption::Crop => fill(image, width, height, Anchor::Center, filter),
        ResampleOption::FillTopLeft => fill(image, width, height, Anchor::TopLeft, filter),
        ResampleOption::FillBottomRight => fill(image, width, height, Anchor::BottomRight, filter),
        ResampleOption::Resize => image.resize_exact(width, height, filter),
        // Fit never upscales.
        _ if image.width() <= width && image.height() <= height => image,
        _ => image.resize(width, height, filter),
    }
}

fn encode(image: &DynamicImage, png: bool, quality: u8) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if png {
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).or_raise(|| ErrorKind::Encode)?;
    } else {
        let rgb = image.to_rgb8();
        JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .or_raise(|| ErrorKind::Encode)?;
    }
    Ok(bytes)
}

fn transform(
    bytes: &[u8],
    width: u32,
    height: u32,
    orientation: u8,
    options: &[ResampleOption],
    settings: &RenderSettings,
) -> Result<Vec<u8>> {
    let mut image = image::load_from_memory(bytes).or_raise(|| ErrorKind::Decode)?;
    if let Some(orientation) = Orientation::from_exif(orientation) {
        image.apply_orientation(orientation);
    }
    let image = resample(image, width, height, options, filter_for(options, settings));
    encode(&image, options.contains(&ResampleOption::Png), settings.quality)
}

fn cut(bytes: &[u8], area: &CropArea, width: u32, height: u32, settings: &RenderSettings) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes).or_raise(|| ErrorKind::Decode)?;
    let (x, y, w, h) = area.to_pixels(image.width(), image.height());
    let image = image.crop_imm(x, y, w, h).resize_to_fill(width, height, settings.filter.into());
    encode(&image, false, settings.quality)
}
