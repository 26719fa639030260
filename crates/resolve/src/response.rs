//! Response selection.
//!
//! Every request ends in a [`Resolution`]: a file to stream (an existing or
//! freshly rendered artifact, or the original) or one of three embedded
//! placeholder images. Download requests carry a suggested filename;
//! everything else is delivered inline.

use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{ErrorKind, Result};

#[derive(Embed)]
#[folder = "../../assets/placeholders/"]
struct Assets;

/// Placeholder images served in place of a thumbnail that can't be produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Request could not be resolved (bad size, unknown hash, index down).
    Generic,
    /// The source exists in the index but can't be rendered right now.
    Broken,
    /// Neither the file nor any of its siblings is in a renderable format.
    Unsupported,
}
impl Placeholder {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Generic => "generic.svg",
            Self::Broken => "broken.svg",
            Self::Unsupported => "unsupported.svg",
        }
    }

    pub fn svg(self) -> Result<Cow<'static, [u8]>> {
        Assets::get(self.file_name()).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetMissing(self.file_name()))
    }
}

/// Where the served file came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Request cache hit, re-verified on storage.
    Cached,
    /// Artifact already present in the thumbnail store.
    Existing,
    /// Size exceeds the render limit; the source file itself is served.
    Original,
    Rendered,
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Inline,
    /// Downloaded under the suggested filename.
    Attachment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub outcome: Outcome,
    /// Absolute path of the file to stream; `None` for placeholders.
    pub path: Option<PathBuf>,
    pub delivery: Delivery,
}

impl Resolution {
    pub(crate) fn file(outcome: Outcome, path: PathBuf, delivery: Delivery) -> Self {
        Self { outcome, path: Some(path), delivery }
    }

    /// Placeholders are always inline, even for download requests.
    pub(crate) fn placeholder(placeholder: Placeholder) -> Self {
        Self { outcome: Outcome::Placeholder(placeholder), path: None, delivery: Delivery::Inline }
    }

    pub fn as_placeholder(&self) -> Option<Placeholder> {
        match self.outcome {
            Outcome::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn download_name(&self) -> Option<&str> {
        match &self.delivery {
            Delivery::Attachment(name) => Some(name),
            Delivery::Inline => None,
        }
    }

    /// MIME type of the payload.
    pub fn content_type(&self) -> &'static str {
        if self.as_placeholder().is_some() {
            return "image/svg+xml";
        }
        match self.path.as_deref().and_then(Path::extension).and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
            _ => "image/jpeg",
        }
    }
}
