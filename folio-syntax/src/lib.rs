/*!
A low-level crate for reading PDF files into an editable object graph.

This crate turns the bytes of a (possibly malformed) PDF file into a [`Context`], an owned
registry of indirect objects that can be inspected and mutated freely. Unlike a zero-copy
reader, every object is fully materialized: dictionaries and arrays own their values and
references are resolved on demand through the context, so forward references and cycles
never pose a problem.

The main entry point is [`parse_document`]. If you need more control over the process, you
can use [`Parser`] directly, which also gives access to the individual update layers of an
incrementally saved file.

```no_run
use folio_syntax::{ParseOptions, parse_document};
use folio_syntax::object::Catalog;

let data = std::fs::read("document.pdf").unwrap();
let ctx = parse_document(&data, &ParseOptions::default()).unwrap();
let catalog = ctx.catalog().unwrap();
println!("the document has {} pages", folio_syntax::page::pages(&ctx).len());
# let _: Option<Catalog<'_>> = catalog;
```

Serializing a context back into bytes is handled by the `folio-write` crate.

# Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod context;
mod error;
pub mod filter;
pub mod metadata;
pub mod object;
pub(crate) mod object_stream;
pub mod page;
mod parser;
pub(crate) mod reader;
pub(crate) mod trivia;
pub(crate) mod util;
pub mod walk;
pub mod write;
pub mod xref;

pub use context::{Context, Header};
pub use error::{LookupError, PageError, ParseError};
pub use object::ObjRef;
pub use parser::{ParseOptions, ParseSpeed, Parser, UpdateLayer, normalize, parse_document};
