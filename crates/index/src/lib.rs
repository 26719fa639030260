//! SQLite content index.
//!
//! The index maps content hashes to the physical files of content items.
//! Thumbnail resolution only reads it, apart from one bookkeeping mutation:
//! flagging a file as missing once storage no longer has it, which deletes
//! the owning item when that was its last present file.
//!
//! # Architecture
//! - **Items**: a photo, scan, or other unit of content, with a title and
//!   capture time used for share names.
//! - **FileRecords**: physical files of an item (the original, sidecars,
//!   conversions), each under a named storage root. Several files may share
//!   a content hash; one per item is primary.

mod adapter;
mod db;
pub mod error;
mod models;
mod repo;

pub use crate::adapter::{Index, IndexHandle};
pub use crate::db::Database;
pub use crate::models::{DownloadName, FileFormat, FileRecord, Item, NewFile};
pub use crate::repo::{Pruned, Repository};
