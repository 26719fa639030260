//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Hash too short to shard artifacts by.
    #[display("invalid hash: {_0:?}")]
    InvalidHash(#[error(not(source))] String),
    /// Zero or over-limit target dimensions.
    #[display("invalid size: {_0}x{_1}")]
    InvalidSize(#[error(not(source))] u32, #[error(not(source))] u32),
    /// Crop area identifier is not 12 digits of per-mille fractions.
    #[display("invalid crop area: {_0:?}")]
    InvalidArea(#[error(not(source))] String),
    #[display("unknown resample filter: {_0:?}")]
    InvalidFilter(#[error(not(source))] String),
    /// The file to render from does not exist.
    #[display("render source missing: {}", _0.display())]
    SourceMissing(#[error(not(source))] PathBuf),
    #[display("could not decode image")]
    Decode,
    #[display("could not encode image")]
    Encode,
    /// Reading or writing the artifact store failed.
    #[display("artifact storage error")]
    Storage,
    #[display("render task failed")]
    Task,
}
