use crate::error::DocumentError;
use folio_syntax::metadata::Metadata;
use folio_syntax::object::dict::keys::{MEDIA_BOX, PAGE, TYPE};
use folio_syntax::object::{Dict, Object};
use folio_syntax::{Context, Header, ObjRef, ParseOptions, dict, page, parse_document};
use folio_write::{ObjectCopier, WriteOptions, Writer};
use log::debug;

/// The media box given to new pages that don't define or inherit one: US Letter.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Options for loading a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// The options passed to the parser.
    pub parse: ParseOptions,
}

/// A PDF document that can be inspected, edited and saved.
#[derive(Debug, Clone)]
pub struct Document {
    ctx: Context,
}

impl Document {
    /// Load a document with the default options.
    pub fn load(data: &[u8]) -> Result<Self, DocumentError> {
        Self::load_with(data, &LoadOptions::default())
    }

    /// Load a document.
    pub fn load_with(data: &[u8], options: &LoadOptions) -> Result<Self, DocumentError> {
        let ctx = parse_document(data, &options.parse)?;
        debug!("loaded document with {} objects", ctx.len());

        Ok(Self { ctx })
    }

    /// Create a new document without any pages.
    pub fn create() -> Self {
        let mut ctx = Context::new();
        let pages = ctx.register(dict! {
            "Type" => "Pages",
            "Kids" => Vec::<ObjRef>::new(),
            "Count" => 0,
        });
        let catalog = ctx.register(dict! { "Type" => "Catalog", "Pages" => pages });
        ctx.set_root(Some(catalog));

        Self { ctx }
    }

    /// Wrap an existing context.
    pub fn from_context(ctx: Context) -> Self {
        Self { ctx }
    }

    /// The underlying context.
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// The underlying context, mutably.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.ctx
    }

    /// Consume the document, returning the underlying context.
    pub fn into_context(self) -> Context {
        self.ctx
    }

    /// The version of the document.
    pub fn version(&self) -> Header {
        self.ctx.header()
    }

    /// Set the version of the document.
    pub fn set_version(&mut self, version: Header) {
        self.ctx.set_header(version);
    }

    /// The number of pages.
    pub fn page_count(&self) -> usize {
        self.page_refs().len()
    }

    /// The references to all pages, in order.
    pub fn page_refs(&self) -> Vec<ObjRef> {
        page::pages(&self.ctx)
    }

    /// Append a new page, returning its reference.
    ///
    /// The dictionary is marked as a page, and given a US Letter media box if it neither
    /// has one nor inherits one from the page tree.
    pub fn add_page(&mut self, page: Dict) -> Result<ObjRef, DocumentError> {
        let count = self.page_count();
        self.insert_page(count, page)
    }

    /// Insert a new page so that it ends up at `index`, returning its reference.
    pub fn insert_page(&mut self, index: usize, mut page: Dict) -> Result<ObjRef, DocumentError> {
        let count = self.page_count();

        if index > count {
            return Err(DocumentError::InvalidPageIndex { index, count });
        }

        page.insert(TYPE, Object::Name(PAGE.into()));

        let page_ref = self.ctx.register(page);

        if let Err(e) = page::insert_page(&mut self.ctx, index, page_ref) {
            self.ctx.delete(page_ref);

            return Err(e.into());
        }

        if page::inherited(&self.ctx, page_ref, MEDIA_BOX).is_none()
            && let Some(dict) = self
                .ctx
                .lookup_ref_mut(page_ref)
                .and_then(Object::as_dict_mut)
        {
            dict.insert(MEDIA_BOX, Vec::from(DEFAULT_MEDIA_BOX));
        }

        Ok(page_ref)
    }

    /// Remove the page at `index` from the document, returning its reference.
    ///
    /// The page object stays in the document until it is pruned or the document is saved
    /// with pruning.
    pub fn remove_page(&mut self, index: usize) -> Result<ObjRef, DocumentError> {
        let count = self.page_count();

        if index >= count {
            return Err(DocumentError::InvalidPageIndex { index, count });
        }

        Ok(page::remove_page(&mut self.ctx, index)?)
    }

    /// Copy pages from another document and append them to this one.
    ///
    /// Objects shared between the copied pages, such as fonts, are copied only once.
    /// Returns the references to the new pages.
    pub fn copy_pages_from(
        &mut self,
        other: &Self,
        indices: &[usize],
    ) -> Result<Vec<ObjRef>, DocumentError> {
        let source_pages = other.page_refs();
        let count = source_pages.len();

        let sources = indices
            .iter()
            .map(|&index| {
                source_pages
                    .get(index)
                    .copied()
                    .ok_or(DocumentError::InvalidPageIndex { index, count })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut copier = ObjectCopier::new(&other.ctx, &mut self.ctx);
        let copied = sources
            .into_iter()
            .map(|r| copier.copy_ref(r))
            .collect::<Result<Vec<_>, _>>()?;
        drop(copier);

        for page in &copied {
            page::append_page(&mut self.ctx, *page)?;
        }

        debug!("copied {} pages", copied.len());

        Ok(copied)
    }

    /// The metadata of the document.
    pub fn metadata(&self) -> Metadata {
        Metadata::read(&self.ctx)
    }

    /// Replace the metadata of the document.
    pub fn set_metadata(&mut self, metadata: &Metadata) {
        metadata.write(&mut self.ctx);
    }

    /// Delete every object that is no longer reachable, returning how many objects were
    /// removed.
    pub fn prune(&mut self) -> usize {
        self.ctx.prune_unreachable()
    }

    /// Serialize the document.
    pub fn save(&mut self, options: WriteOptions) -> Result<Vec<u8>, DocumentError> {
        Ok(Writer::for_context(&mut self.ctx, options).serialize_to_buffer()?)
    }

    /// Serialize the document, periodically yielding to the executor.
    pub async fn save_async(&mut self, options: WriteOptions) -> Result<Vec<u8>, DocumentError> {
        Ok(Writer::for_context(&mut self.ctx, options)
            .serialize_to_buffer_async()
            .await?)
    }
}
