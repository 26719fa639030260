//! Resolution Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. None of these escape [`Resolver`]:
//! each kind maps onto the placeholder that is served instead.
//!
//! [`Resolver`]: crate::Resolver

use derive_more::{Display, Error};
use std::path::PathBuf;

use crate::response::Placeholder;

/// A resolution error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resolution steps.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No size class is registered under the requested name.
    #[display("invalid size class: {_0}")]
    InvalidSizeClass(#[error(not(source))] String),
    /// The size class is uncached, on-demand rendering is disabled, and no
    /// precomputed class can stand in for it.
    #[display("size class not allowed by policy: {_0}")]
    InvalidSizePolicy(#[error(not(source))] String),
    /// Crop requested with a size class that is not a crop class.
    #[display("not a crop size: {_0}")]
    InvalidCropSize(#[error(not(source))] String),
    #[display("no file indexed for hash: {_0}")]
    RecordNotFound(#[error(not(source))] String),
    /// The indexed file can't be rendered and its item has no file that can.
    #[display("unsupported format for hash: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// The index recorded an error for the file when it was indexed.
    #[display("file has a recorded error: {_0}")]
    RecordBroken(#[error(not(source))] String),
    #[display("source file missing: {}", _0.display())]
    SourceFileMissing(#[error(not(source))] PathBuf),
    #[display("index lookup failed")]
    Index,
    /// Probing storage failed for a reason other than the file being absent.
    #[display("storage probe failed")]
    Storage,
    #[display("rendering failed")]
    RenderFailure,
    /// The renderer claimed success but returned no path.
    #[display("renderer returned an empty path")]
    EmptyRenderResult,
    /// A placeholder image is not among the embedded assets.
    #[display("placeholder asset missing: {_0}")]
    AssetMissing(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Placeholder served in place of the requested thumbnail.
    pub fn placeholder(&self) -> Placeholder {
        match self {
            Self::InvalidSizeClass(_)
            | Self::InvalidSizePolicy(_)
            | Self::InvalidCropSize(_)
            | Self::RecordNotFound(_)
            | Self::Index
            | Self::AssetMissing(_) => Placeholder::Generic,
            Self::UnsupportedFormat(_) => Placeholder::Unsupported,
            Self::RecordBroken(_)
            | Self::SourceFileMissing(_)
            | Self::Storage
            | Self::RenderFailure
            | Self::EmptyRenderResult => Placeholder::Broken,
        }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Index | Self::Storage | Self::RenderFailure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::InvalidSizeClass("fit_9".into()), Placeholder::Generic)]
    #[case(ErrorKind::InvalidSizePolicy("fit_4096".into()), Placeholder::Generic)]
    #[case(ErrorKind::InvalidCropSize("tile_50".into()), Placeholder::Generic)]
    #[case(ErrorKind::RecordNotFound("abcd".into()), Placeholder::Generic)]
    #[case(ErrorKind::UnsupportedFormat("abcd".into()), Placeholder::Unsupported)]
    #[case(ErrorKind::RecordBroken("truncated".into()), Placeholder::Broken)]
    #[case(ErrorKind::SourceFileMissing("a.jpg".into()), Placeholder::Broken)]
    #[case(ErrorKind::RenderFailure, Placeholder::Broken)]
    #[case(ErrorKind::EmptyRenderResult, Placeholder::Broken)]
    fn test_placeholder(#[case] kind: ErrorKind, #[case] expected: Placeholder) {
        assert_eq!(kind.placeholder(), expected);
    }

    #[rstest]
    #[case(ErrorKind::Index, true)]
    #[case(ErrorKind::Storage, true)]
    #[case(ErrorKind::RenderFailure, true)]
    #[case(ErrorKind::EmptyRenderResult, false)]
    #[case(ErrorKind::RecordNotFound("abcd".into()), false)]
    #[case(ErrorKind::InvalidSizeClass("fit_9".into()), false)]
    fn test_is_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }
}
