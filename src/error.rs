//! Command-line error types.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("failed to load configuration")]
    Config,
    #[display("failed to open storage root: {_0}")]
    Storage(#[error(not(source))] String),
    #[display("failed to open index")]
    Index,
    #[display("failed to write output")]
    Output,
}
