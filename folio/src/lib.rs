/*!
A crate for reading, editing and writing PDF files.

This crate ties together [`folio_syntax`], which parses PDF files into an editable object
graph, and [`folio_write`], which copies objects between documents and serializes them again.
[`Document`] offers the common operations on whole documents: working with pages, copying
pages between documents, editing metadata and saving.

```
use folio::{Document, WriteOptions};
use folio::folio_syntax::dict;

let mut doc = Document::create();
doc.add_page(dict! {}).unwrap();

let bytes = doc.save(WriteOptions::default()).unwrap();
let reloaded = Document::load(&bytes).unwrap();
assert_eq!(reloaded.page_count(), 1);
```

Encrypted documents are not supported: loading one fails unless
[`ParseOptions::ignore_encryption`] is set, in which case the objects are kept as they are.

## Safety
This crate forbids unsafe code via a crate-level attribute.
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod document;
mod error;

pub use document::{Document, LoadOptions};
pub use error::DocumentError;
pub use folio_syntax;
pub use folio_syntax::metadata::Metadata;
pub use folio_syntax::{Context, Header, ObjRef, ParseOptions, ParseSpeed};
pub use folio_write;
pub use folio_write::{ObjectCopier, WriteOptions};
