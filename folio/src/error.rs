//! Errors returned by [`Document`](crate::Document).

use folio_syntax::{LookupError, PageError, ParseError};
use folio_write::{CopyError, WriteError};
use thiserror::Error;

/// An error returned by an operation on a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The document could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// An object had an unexpected type.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// The page tree could not be edited.
    #[error(transparent)]
    Page(#[from] PageError),

    /// Objects could not be copied from another document.
    #[error(transparent)]
    Copy(#[from] CopyError),

    /// The document could not be serialized.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// A page index is out of bounds.
    #[error("page index {index} is out of bounds for a document with {count} pages")]
    InvalidPageIndex {
        /// The requested index.
        index: usize,
        /// The number of pages in the document.
        count: usize,
    },
}
