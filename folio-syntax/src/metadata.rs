//! Reading and writing document metadata.

use crate::context::Context;
use crate::object::dict::keys::*;
use crate::object::{DateTime, Dict, Object, PdfString};

#[derive(Clone, Default, Debug, PartialEq, Eq)]
/// The metadata of a PDF document, as stored in its information dictionary.
pub struct Metadata {
    /// The title of the document.
    pub title: Option<String>,
    /// The author of the document.
    pub author: Option<String>,
    /// The subject of the document.
    pub subject: Option<String>,
    /// The keywords of the document.
    pub keywords: Option<String>,
    /// The application that created the original document.
    pub creator: Option<String>,
    /// The application that produced the PDF file.
    pub producer: Option<String>,
    /// The creation date of the document.
    pub creation_date: Option<DateTime>,
    /// The modification date of the document.
    pub modification_date: Option<DateTime>,
}

const TEXT_KEYS: [&[u8]; 6] = [TITLE, AUTHOR, SUBJECT, KEYWORDS, CREATOR, PRODUCER];

impl Metadata {
    /// Read the metadata from the information dictionary of a document.
    ///
    /// Entries of the wrong type are ignored.
    pub fn read(ctx: &Context) -> Self {
        let Some(info) = ctx
            .info()
            .and_then(|r| ctx.lookup_ref(r))
            .and_then(Object::as_dict)
        else {
            return Self::default();
        };

        let text = |key: &[u8]| {
            info.get(key)
                .and_then(|o| ctx.lookup(o))
                .and_then(Object::as_string)
                .map(PdfString::to_text)
        };
        let date = |key: &[u8]| {
            info.get(key)
                .and_then(|o| ctx.lookup(o))
                .and_then(Object::as_string)
                .and_then(PdfString::to_date)
        };

        Self {
            title: text(TITLE),
            author: text(AUTHOR),
            subject: text(SUBJECT),
            keywords: text(KEYWORDS),
            creator: text(CREATOR),
            producer: text(PRODUCER),
            creation_date: date(CREATION_DATE),
            modification_date: date(MOD_DATE),
        }
    }

    /// Write the metadata into the information dictionary of a document.
    ///
    /// The dictionary is created if the document doesn't have one yet. Fields that are `None`
    /// are removed from it, entries not covered by [`Metadata`] are kept.
    pub fn write(&self, ctx: &mut Context) {
        let existing = ctx
            .info()
            .filter(|r| ctx.lookup_ref(*r).and_then(Object::as_dict).is_some());

        let info = match existing {
            Some(r) => r,
            None => {
                let r = ctx.register(Dict::new());
                ctx.set_info(Some(r));
                r
            }
        };

        let Some(dict) = ctx.lookup_ref_mut(info).and_then(Object::as_dict_mut) else {
            return;
        };

        let texts = [
            &self.title,
            &self.author,
            &self.subject,
            &self.keywords,
            &self.creator,
            &self.producer,
        ];

        for (key, value) in TEXT_KEYS.into_iter().zip(texts) {
            set_or_remove(dict, key, value.as_deref().map(PdfString::from_text));
        }

        set_or_remove(
            dict,
            CREATION_DATE,
            self.creation_date.as_ref().map(PdfString::from_date),
        );
        set_or_remove(
            dict,
            MOD_DATE,
            self.modification_date.as_ref().map(PdfString::from_date),
        );
    }
}

fn set_or_remove(dict: &mut Dict, key: &[u8], value: Option<PdfString>) {
    match value {
        Some(value) => {
            dict.insert(key, value);
        }
        None => {
            dict.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::dict;
    use crate::metadata::Metadata;
    use crate::object::{DateTime, Object, PdfString};

    #[test]
    fn missing_info() {
        assert_eq!(Metadata::read(&Context::new()), Metadata::default());
    }

    #[test]
    fn read_info() {
        let mut ctx = Context::new();
        let title = ctx.register(PdfString::literal(b"Indirect title".to_vec()));
        let info = ctx.register(dict! {
            "Title" => title,
            "Author" => PdfString::from_text("Zoë"),
            "Subject" => 12,
            "CreationDate" => PdfString::literal(b"D:20230415103000+02'00".to_vec()),
        });
        ctx.set_info(Some(info));

        let metadata = Metadata::read(&ctx);
        assert_eq!(metadata.title.as_deref(), Some("Indirect title"));
        assert_eq!(metadata.author.as_deref(), Some("Zoë"));
        assert_eq!(metadata.subject, None);
        assert_eq!(
            metadata.creation_date,
            Some(DateTime::new(2023, 4, 15, 10, 30, 0).with_utc_offset(120))
        );
    }

    #[test]
    fn write_creates_info() {
        let mut ctx = Context::new();
        let metadata = Metadata {
            title: Some("Report".to_string()),
            modification_date: Some(DateTime::new(2024, 1, 2, 3, 4, 5)),
            ..Metadata::default()
        };

        metadata.write(&mut ctx);
        assert!(ctx.info().is_some());
        assert_eq!(Metadata::read(&ctx), metadata);
    }

    #[test]
    fn write_updates_existing() {
        let mut ctx = Context::new();
        let info = ctx.register(dict! {
            "Title" => PdfString::literal(b"Old".to_vec()),
            "Custom" => "Kept",
        });
        ctx.set_info(Some(info));

        Metadata {
            producer: Some("folio".to_string()),
            ..Metadata::default()
        }
        .write(&mut ctx);

        assert_eq!(ctx.info(), Some(info));
        let dict = ctx.lookup_ref(info).and_then(Object::as_dict).unwrap();
        assert!(dict.get(b"Title").is_none());
        assert!(dict.get(b"Custom").is_some());
        assert_eq!(
            dict.get(b"Producer").and_then(Object::as_string).unwrap().as_bytes(),
            b"folio"
        );
    }
}
