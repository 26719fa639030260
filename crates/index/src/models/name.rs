use rslug::slugify;
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};
use time::UtcDateTime;

use crate::error::{Error, ErrorKind};

/// Policy for the filename suggested to clients downloading a thumbnail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadName {
    /// Base name of the stored file.
    File,
    /// Name the file was uploaded with, falling back to [`File`](Self::File).
    Original,
    /// Capture time and title, e.g. `20240517-093012-Lake-Bled.jpg`.
    #[default]
    Share,
}
impl FromStr for DownloadName {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "file" => Self::File,
            "original" => Self::Original,
            "share" => Self::Share,
            _ => exn::bail!(ErrorKind::InvalidData("download name")),
        })
    }
}
impl Display for DownloadName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::File => "file",
            Self::Original => "original",
            Self::Share => "share",
        })
    }
}

/// Build a share name: `YYYYMMDD-HHMMSS-Title-Slug.ext`.
///
/// An item without a usable title falls back to `fallback` (usually a short
/// prefix of the file hash).
pub(crate) fn share_name(taken_at: UtcDateTime, title: &str, fallback: &str, ext: &str) -> String {
    let slug = title_slug(title);
    let middle = if slug.is_empty() { fallback } else { &slug };
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}-{middle}.{ext}",
        taken_at.year(),
        u8::from(taken_at.month()),
        taken_at.day(),
        taken_at.hour(),
        taken_at.minute(),
        taken_at.second(),
    )
}

/// Slugify, then capitalise each word: `"lake bled, day 2"` → `Lake-Bled-Day-2`.
fn title_slug(title: &str) -> String {
    let slug: String = slugify!(title);
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}
