mod file;
mod format;
mod name;

pub use self::file::{FileRecord, Item, NewFile};
pub(crate) use self::file::{FileRow, ItemRow};
pub use self::format::FileFormat;
pub use self::name::DownloadName;
