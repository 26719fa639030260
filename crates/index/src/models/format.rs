use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use crate::error::{Error, ErrorKind};

/// Media format of an indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Heif,
    Raw,
    Video,
    Sidecar,
    Other,
}
impl FileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Heif => "heif",
            Self::Raw => "raw",
            Self::Video => "video",
            Self::Sidecar => "sidecar",
            Self::Other => "other",
        }
    }

    /// Whether the renderer can decode this format directly.
    pub fn is_renderable(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png)
    }
}
impl FromStr for FileFormat {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg,
            "png" => Self::Png,
            "gif" => Self::Gif,
            "webp" => Self::Webp,
            "heif" | "heic" | "avif" => Self::Heif,
            "raw" | "dng" | "cr2" | "nef" | "arw" => Self::Raw,
            "video" | "mp4" | "mov" => Self::Video,
            "sidecar" | "xmp" | "json" => Self::Sidecar,
            "other" => Self::Other,
            _ => exn::bail!(ErrorKind::InvalidData("file format")),
        })
    }
}
impl Display for FileFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
