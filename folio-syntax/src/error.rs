//! Errors produced while parsing and inspecting documents.

use crate::object::ObjRef;
use thiserror::Error;

/// An error that makes parsing a document impossible.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No `%PDF-M.m` header was found in the first kilobyte of the file.
    #[error("no PDF header found in the first 1024 bytes")]
    MissingHeader,

    /// An indirect object could not be parsed and strict parsing was requested.
    #[error("invalid object at offset {offset}")]
    InvalidObject {
        /// The byte offset at which the object starts.
        offset: usize,
    },

    /// A cross-reference section could not be parsed and strict parsing was requested.
    #[error("invalid cross-reference section at offset {offset}")]
    InvalidXRef {
        /// The byte offset of the `xref` keyword or cross-reference stream.
        offset: usize,
    },

    /// The document is encrypted, which is not supported.
    #[error("the document is encrypted")]
    Encrypted,
}

/// An error returned by typed lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The object exists but is of another type than requested.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// The requested type.
        expected: &'static str,
        /// The type of the object that was found.
        found: &'static str,
    },
}

/// An error returned when editing the page tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The document has no catalog to attach a page tree to.
    #[error("the document has no catalog")]
    MissingCatalog,

    /// The page index is out of bounds.
    #[error("page index {index} is out of bounds for a document with {count} pages")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of pages in the document.
        count: usize,
    },

    /// The object to insert is not a page dictionary.
    #[error("object {0} is not a page")]
    NotAPage(ObjRef),

    /// A node of the page tree is malformed.
    #[error("page tree node {0} is malformed")]
    MalformedNode(ObjRef),
}
