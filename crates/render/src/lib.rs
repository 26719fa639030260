//! Thumbnail rendering.
//!
//! The [`Renderer`] trait is the seam between thumbnail resolution and the
//! pixels: resolution decides *which* artifact to produce, a renderer produces
//! it and reports where it landed. [`ImageRenderer`] is the bundled
//! implementation.

mod area;
pub mod error;
mod name;
mod options;
mod raster;

pub use crate::area::CropArea;
pub use crate::name::{artifact_name, crop_name};
pub use crate::options::{Filter, ResampleOption, method_of};
pub use crate::raster::{ImageRenderer, RenderSettings};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Artifact that crops are cut from: `(width, height, options)` of `fit_720`.
pub const CROP_SOURCE: (u32, u32, &[ResampleOption]) = (720, 720, &[ResampleOption::Fit, ResampleOption::Default]);

/// Produces thumbnail artifacts.
///
/// Every method returns the absolute path of the artifact. Implementations own
/// their artifact store; concurrent renders of the same artifact are allowed
/// and last-writer-wins.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Absolute path the artifact for `(hash, width, height, options)` has (or
    /// would have) in the artifact store. Does not check that it exists.
    fn locate(&self, hash: &str, width: u32, height: u32, options: &[ResampleOption]) -> Result<PathBuf>;

    /// Render from the source file, replacing any existing artifact.
    async fn from_source(
        &self,
        source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> Result<PathBuf>;

    /// Return the existing artifact, or render and persist it.
    async fn from_cache(
        &self,
        source: &Path,
        hash: &str,
        width: u32,
        height: u32,
        orientation: u8,
        options: &[ResampleOption],
    ) -> Result<PathBuf>;

    /// Cut a [`CropArea`] out of the hash's [`CROP_SOURCE`] artifact.
    async fn crop(&self, hash: &str, width: u32, height: u32, area: &str) -> Result<PathBuf>;
}

pub type RendererHandle = Arc<dyn Renderer>;
