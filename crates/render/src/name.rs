//! Artifact file naming.
//!
//! Artifacts are sharded by the first three characters of their hash:
//! `a/b/c/abcdef…_720x720_fit.jpg`. Names are relative to the artifact store.

use std::path::PathBuf;

use crate::area::CropArea;
use crate::error::{ErrorKind, Result};
use crate::options::{ResampleOption, method_of};

/// Shortest hash that can be sharded.
const MIN_HASH_LEN: usize = 4;

fn shard(hash: &str) -> Result<PathBuf> {
    if hash.len() < MIN_HASH_LEN || !hash.bytes().all(|b| b.is_ascii_alphanumeric()) {
        exn::bail!(ErrorKind::InvalidHash(hash.to_string()));
    }
    Ok(PathBuf::from(&hash[0..1]).join(&hash[1..2]).join(&hash[2..3]))
}

fn check_size(width: u32, height: u32, max: u32) -> Result<()> {
    if width == 0 || height == 0 || width > max || height > max {
        exn::bail!(ErrorKind::InvalidSize(width, height));
    }
    Ok(())
}

/// Name of the artifact rendered for `(hash, width, height, options)`.
pub fn artifact_name(hash: &str, width: u32, height: u32, options: &[ResampleOption], max: u32) -> Result<PathBuf> {
    let dir = shard(hash)?;
    check_size(width, height, max)?;
    // Infallible: method_of() only returns resample methods.
    let method = method_of(options).method_name().unwrap_or("fit");
    let ext = if options.contains(&ResampleOption::Png) { "png" } else { "jpg" };
    Ok(dir.join(format!("{hash}_{width}x{height}_{method}.{ext}")))
}

/// Name of the crop artifact cut out of `area` at `width`x`height`.
pub fn crop_name(hash: &str, width: u32, height: u32, area: &CropArea, max: u32) -> Result<PathBuf> {
    let dir = shard(hash)?;
    check_size(width, height, max)?;
    Ok(dir.join(format!("{hash}_{width}x{height}_crop_{area}.jpg")))
}
