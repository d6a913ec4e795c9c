//! Errors produced while copying and writing documents.

use folio_syntax::ObjRef;
use thiserror::Error;

/// An error that occurred while copying objects between contexts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CopyError {
    /// A reference in the copied graph doesn't resolve in the source context.
    #[error("reference {0} does not resolve in the source document")]
    DanglingReference(ObjRef),
}

/// An error that makes serializing a context impossible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The context has no document catalog.
    #[error("the document has no root")]
    MissingRoot,

    /// A stream has no `/Length` entry.
    #[error("stream {0} has no length")]
    MissingLength(ObjRef),
}
