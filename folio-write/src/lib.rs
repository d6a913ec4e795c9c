/*!
Copying objects between documents and serializing documents into PDF files.

[`ObjectCopier`] clones a subgraph of one [`Context`](folio_syntax::Context) into another,
for example to move pages between documents. [`Writer`] turns a context into the bytes of a
PDF file, either with a classic cross-reference table or with compressed object streams.

```
use folio_syntax::{Context, dict};
use folio_write::{WriteOptions, Writer};

let mut ctx = Context::new();
let pages = ctx.register(dict! { "Type" => "Pages", "Kids" => Vec::<i32>::new(), "Count" => 0 });
let catalog = ctx.register(dict! { "Type" => "Catalog", "Pages" => pages });
ctx.set_root(Some(catalog));

let bytes = Writer::for_context(&mut ctx, WriteOptions::default())
    .serialize_to_buffer()
    .unwrap();
assert!(bytes.starts_with(b"%PDF-1.7"));
```
*/

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod copy;
mod error;
mod writer;

pub use copy::ObjectCopier;
pub use error::{CopyError, WriteError};
pub use writer::{WriteOptions, Writer};
