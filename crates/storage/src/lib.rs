pub mod backend;
pub mod error;
mod path;
mod roots;

pub use crate::backend::StorageBackend;
pub use crate::path::validate as validate_path;
pub use crate::roots::{ORIGINALS, Roots};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
