use crate::error::{Error, ErrorKind};
use crate::models::{DownloadName, FileFormat, name};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use time::UtcDateTime;

/// One physical file belonging to a content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Owning item.
    pub item_uid: String,
    pub hash: String,
    /// Name of the storage root the file lives under (`/` for originals).
    pub root: String,
    /// Path relative to the storage root.
    pub name: PathBuf,
    /// Name the file was uploaded with, if known.
    pub original_name: Option<String>,
    pub format: FileFormat,
    /// EXIF orientation, 1 to 8.
    pub orientation: u8,
    pub primary: bool,
    pub missing: bool,
    /// Error recorded when the file was indexed; such files are never rendered.
    pub error: Option<String>,
    pub item_title: String,
    pub taken_at: UtcDateTime,
}
impl FileRecord {
    pub fn is_renderable(&self) -> bool {
        self.format.is_renderable()
    }

    pub fn base_name(&self) -> String {
        self.name.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| self.hash.clone())
    }

    fn extension(&self) -> String {
        self.name
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| self.format.to_string())
    }

    /// `YYYYMMDD-HHMMSS-Title-Slug.ext`, derived from the owning item.
    pub fn share_name(&self) -> String {
        let fallback: String = self.hash.chars().take(8).collect();
        name::share_name(self.taken_at, &self.item_title, &fallback, &self.extension())
    }

    /// Suggested filename for a download under the given policy.
    pub fn download_name(&self, policy: DownloadName) -> String {
        match policy {
            DownloadName::File => self.base_name(),
            DownloadName::Original => match self.original_name.as_deref().map(Path::new).and_then(Path::file_name) {
                Some(original) => original.to_string_lossy().into_owned(),
                None => self.base_name(),
            },
            DownloadName::Share => self.share_name(),
        }
    }
}

/// Flat row as selected by the `files JOIN items` queries.
#[derive(sqlx::FromRow)]
pub(crate) struct FileRow {
    pub(crate) id: i64,
    pub(crate) item_uid: String,
    pub(crate) file_hash: String,
    pub(crate) file_root: String,
    pub(crate) file_name: String,
    pub(crate) original_name: String,
    pub(crate) file_format: String,
    pub(crate) file_orientation: i64,
    pub(crate) file_primary: bool,
    pub(crate) file_missing: bool,
    pub(crate) file_error: String,
    pub(crate) item_title: String,
    pub(crate) item_taken_at: i64,
}
impl TryFrom<FileRow> for FileRecord {
    type Error = Error;
    fn try_from(row: FileRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            item_uid: row.item_uid,
            hash: row.file_hash,
            root: row.file_root,
            name: PathBuf::from(row.file_name),
            original_name: Some(row.original_name).filter(|n| !n.is_empty()),
            format: row.file_format.parse()?,
            // Unknown orientation values are treated as "normal", as EXIF
            // readers do.
            orientation: u8::try_from(row.file_orientation).ok().filter(|o| (1..=8).contains(o)).unwrap_or(1),
            primary: row.file_primary,
            missing: row.file_missing,
            error: Some(row.file_error).filter(|e| !e.is_empty()),
            item_title: row.item_title,
            taken_at: UtcDateTime::from_unix_timestamp(row.item_taken_at)
                .or_raise(|| ErrorKind::InvalidData("taken at"))?,
        })
    }
}

/// A content item owning one or more files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub uid: String,
    pub title: String,
    pub taken_at: UtcDateTime,
    /// Set once every file of the item has gone missing.
    pub deleted_at: Option<UtcDateTime>,
}
impl Item {
    pub fn new(uid: impl Into<String>, title: impl Into<String>, taken_at: UtcDateTime) -> Self {
        Self { uid: uid.into(), title: title.into(), taken_at, deleted_at: None }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ItemRow {
    pub(crate) uid: String,
    pub(crate) title: String,
    pub(crate) taken_at: i64,
    pub(crate) deleted_at: Option<i64>,
}
impl TryFrom<ItemRow> for Item {
    type Error = Error;
    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: row.uid,
            title: row.title,
            taken_at: UtcDateTime::from_unix_timestamp(row.taken_at).or_raise(|| ErrorKind::InvalidData("taken at"))?,
            deleted_at: row
                .deleted_at
                .map(UtcDateTime::from_unix_timestamp)
                .transpose()
                .or_raise(|| ErrorKind::InvalidData("deleted at"))?,
        })
    }
}

/// A file to be added to (or updated in) the index.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub item_uid: String,
    pub hash: String,
    pub root: String,
    pub name: PathBuf,
    pub original_name: Option<String>,
    pub format: FileFormat,
    pub orientation: u8,
    pub primary: bool,
    pub error: Option<String>,
}
impl NewFile {
    pub fn new(item_uid: impl Into<String>, hash: impl Into<String>, name: impl Into<PathBuf>, format: FileFormat) -> Self {
        Self {
            item_uid: item_uid.into(),
            hash: hash.into(),
            root: "/".to_string(),
            name: name.into(),
            original_name: None,
            format,
            orientation: 1,
            primary: false,
            error: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root = root.into();
        self
    }

    pub fn with_original_name(mut self, name: impl Into<String>) -> Self {
        self.original_name = Some(name.into());
        self
    }

    pub fn with_orientation(mut self, orientation: u8) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
