//! Dictionaries.

use crate::object::{DictKind, Name, ObjRef, Object, ObjectLike, object};
use crate::reader::{Readable, Reader, ReaderContext};
use indexmap::IndexMap;
use indexmap::map::{Iter, Keys, Values};
use log::warn;
use rustc_hash::FxBuildHasher;
use std::fmt::{Debug, Formatter};

/// A dictionary, which is a key-value map, keys being names, and values being any PDF object or
/// object reference.
///
/// Entries keep their insertion order.
#[derive(Clone, Default, PartialEq)]
pub struct Dict(IndexMap<Name, Object, FxBuildHasher>);

impl Dict {
    /// Create a new empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries in the dictionary.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checks whether the dictionary contains an entry with a specific key.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the entry of a key, without resolving references.
    pub fn get(&self, key: &[u8]) -> Option<&Object> {
        self.0.get(key)
    }

    /// Returns a mutable reference to the entry of a key.
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut Object> {
        self.0.get_mut(key)
    }

    /// Returns the entry of a key cast to a specific type, without resolving references.
    pub fn get_as<'a, T: ObjectLike<'a>>(&'a self, key: &[u8]) -> Option<T> {
        self.get(key).and_then(|o| o.cast::<T>())
    }

    /// Returns the entry of a key if it is a reference.
    pub fn get_ref(&self, key: &[u8]) -> Option<ObjRef> {
        self.get_as::<ObjRef>(key)
    }

    /// Returns the entry of a key if it is a name.
    pub fn get_name(&self, key: &[u8]) -> Option<&Name> {
        self.get_as::<&Name>(key)
    }

    /// Insert an entry, returning the old value if there was one.
    ///
    /// Replacing an existing entry keeps its position.
    pub fn insert(&mut self, key: impl Into<Name>, value: impl Into<Object>) -> Option<Object> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove an entry, keeping the order of the remaining ones.
    pub fn remove(&mut self, key: &[u8]) -> Option<Object> {
        self.0.shift_remove(key)
    }

    /// Returns an iterator over all entries.
    pub fn iter(&self) -> Iter<'_, Name, Object> {
        self.0.iter()
    }

    /// Returns an iterator over all keys.
    pub fn keys(&self) -> Keys<'_, Name, Object> {
        self.0.keys()
    }

    /// Returns an iterator over all values.
    pub fn values(&self) -> Values<'_, Name, Object> {
        self.0.values()
    }

    /// Returns a mutable iterator over all values.
    pub fn values_mut(&mut self) -> indexmap::map::ValuesMut<'_, Name, Object> {
        self.0.values_mut()
    }

    /// The role of the dictionary, as determined by its `/Type` or `/Linearized` entry.
    pub fn kind(&self) -> DictKind {
        DictKind::of(self)
    }

    /// Scale all array values of the dictionary.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        for value in self.0.values_mut() {
            if let Object::Array(a) = value {
                a.scale(sx, sy);
            }
        }
    }
}

impl Debug for Dict {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Dict {
    type Item = (&'a Name, &'a Object);
    type IntoIter = Iter<'a, Name, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<K: Into<Name>, V: Into<Object>> FromIterator<(K, V)> for Dict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

object!(Dict, Dict);

impl Readable for Dict {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        r.forward_tag(b"<<")?;

        ctx.nested(|ctx| {
            let mut map = IndexMap::with_hasher(FxBuildHasher);

            loop {
                r.skip_white_spaces_and_comments();

                if let Some(()) = r.forward_tag(b">>") {
                    return Some(Self(map));
                }

                let Some(key) = r.read::<Name>(ctx) else {
                    warn!("expected a dictionary key at offset {}", r.offset());
                    return None;
                };

                r.skip_white_spaces_and_comments();

                // A missing value right before the closing delimiter is treated as null.
                if r.peek_tag(b">>").is_some() {
                    warn!("dictionary entry {key:?} has no value");
                    map.insert(key, Object::Null);
                    continue;
                }

                let Some(value) = r.read::<Object>(ctx) else {
                    warn!("failed to read value of {key:?} at offset {}", r.offset());
                    return None;
                };

                // A null value is equivalent to the entry not existing.
                if !value.is_null() {
                    map.insert(key, value);
                }
            }
        })
    }
}

/// A collection of possible keys in a PDF dictionary.
#[allow(missing_docs)]
pub mod keys {
    macro_rules! key {
        ($i:ident, $e:expr) => {
            pub const $i: &'static [u8] = $e;
        };
    }

    key!(ASCII_HEX_DECODE, b"ASCIIHexDecode");
    key!(ASCII_HEX_DECODE_ABBREVIATION, b"AHx");
    key!(ASCII85_DECODE, b"ASCII85Decode");
    key!(ASCII85_DECODE_ABBREVIATION, b"A85");
    key!(AUTHOR, b"Author");
    key!(BITS_PER_COMPONENT, b"BitsPerComponent");
    key!(CATALOG, b"Catalog");
    key!(CCITTFAX_DECODE, b"CCITTFaxDecode");
    key!(CCITTFAX_DECODE_ABBREVIATION, b"CCF");
    key!(COLORS, b"Colors");
    key!(COLUMNS, b"Columns");
    key!(CONTENTS, b"Contents");
    key!(COUNT, b"Count");
    key!(CREATION_DATE, b"CreationDate");
    key!(CREATOR, b"Creator");
    key!(CROP_BOX, b"CropBox");
    key!(CRYPT, b"Crypt");
    key!(DCT_DECODE, b"DCTDecode");
    key!(DCT_DECODE_ABBREVIATION, b"DCT");
    key!(DECODE_PARMS, b"DecodeParms");
    key!(DP, b"DP");
    key!(EARLY_CHANGE, b"EarlyChange");
    key!(ENCRYPT, b"Encrypt");
    key!(EXTENDS, b"Extends");
    key!(F, b"F");
    key!(FILTER, b"Filter");
    key!(FIRST, b"First");
    key!(FLATE_DECODE, b"FlateDecode");
    key!(FLATE_DECODE_ABBREVIATION, b"Fl");
    key!(H, b"H");
    key!(ID, b"ID");
    key!(INDEX, b"Index");
    key!(INFO, b"Info");
    key!(JBIG2_DECODE, b"JBIG2Decode");
    key!(JPX_DECODE, b"JPXDecode");
    key!(KEYWORDS, b"Keywords");
    key!(KIDS, b"Kids");
    key!(L, b"L");
    key!(LENGTH, b"Length");
    key!(LINEARIZED, b"Linearized");
    key!(LZW_DECODE, b"LZWDecode");
    key!(LZW_DECODE_ABBREVIATION, b"LZW");
    key!(MEDIA_BOX, b"MediaBox");
    key!(MOD_DATE, b"ModDate");
    key!(N, b"N");
    key!(O, b"O");
    key!(OBJ_STM, b"ObjStm");
    key!(PAGE, b"Page");
    key!(PAGES, b"Pages");
    key!(PARENT, b"Parent");
    key!(PREDICTOR, b"Predictor");
    key!(PREV, b"Prev");
    key!(PRODUCER, b"Producer");
    key!(RESOURCES, b"Resources");
    key!(ROOT, b"Root");
    key!(ROTATE, b"Rotate");
    key!(RUN_LENGTH_DECODE, b"RunLengthDecode");
    key!(RUN_LENGTH_DECODE_ABBREVIATION, b"RL");
    key!(SIZE, b"Size");
    key!(SUBJECT, b"Subject");
    key!(T, b"T");
    key!(TITLE, b"Title");
    key!(TYPE, b"Type");
    key!(VERSION, b"Version");
    key!(W, b"W");
    key!(XREF, b"XRef");
    key!(XREF_STM, b"XRefStm");
}

#[cfg(test)]
mod tests {
    use crate::object::dict::keys::*;
    use crate::object::{Dict, DictKind, Name, Number, ObjRef, Object};
    use crate::reader::Reader;

    fn dict_impl(data: &[u8]) -> Option<Dict> {
        Reader::new(data).read_without_context::<Dict>()
    }

    #[test]
    fn empty_dict_1() {
        assert_eq!(dict_impl(b"<<>>").unwrap().len(), 0);
    }

    #[test]
    fn empty_dict_2() {
        assert_eq!(dict_impl(b"<<   \n >>").unwrap().len(), 0);
    }

    #[test]
    fn dict_1() {
        let dict = dict_impl(b"<<  /Hi 34.0 >>").unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(b"Hi").unwrap().as_f64(), Some(34.0));
    }

    #[test]
    fn dict_2() {
        let dict = dict_impl(b"<<  /Hi \n 34.0 /Second true >>").unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(b"Second"), Some(&Object::Boolean(true)));
    }

    #[test]
    fn dict_complex() {
        let data = "<< /Type /Example
/Subtype /DictionaryExample
/Version 0.01
/IntegerItem 12
/StringItem (a string)
/Subdictionary << /Item1 0.4
                /Item2 true
                /LastItem (not!)
                /VeryLastItem (OK)
              >>
>>";

        let dict = Reader::new(data.as_bytes())
            .read_without_context::<Dict>()
            .unwrap();
        assert_eq!(dict.len(), 6);
        assert!(dict.get(b"Subdictionary").unwrap().as_dict().is_some());
    }

    #[test]
    fn dict_with_refs() {
        let dict = dict_impl(b"<< /Pages 2 0 R /Outlines 3 0 R >>").unwrap();
        assert_eq!(dict.get_ref(PAGES), Some(ObjRef::new(2, 0)));
    }

    #[test]
    fn dict_null_value_removed() {
        let dict = dict_impl(b"<< /A null /B 1 >>").unwrap();
        assert!(!dict.contains_key(b"A"));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn dict_missing_value() {
        let dict = dict_impl(b"<< /A 1 /B >>").unwrap();
        assert_eq!(dict.get(b"B"), Some(&Object::Null));
    }

    #[test]
    fn dict_invalid_key() {
        assert!(dict_impl(b"<< 34 /A >>").is_none());
    }

    #[test]
    fn dict_keeps_order() {
        let dict = dict_impl(b"<< /Z 1 /A 2 /M 3 >>").unwrap();
        let keys = dict.keys().map(|k| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["Z", "A", "M"]);
    }

    #[test]
    fn insert_and_remove_keep_order() {
        let mut dict = Dict::new();
        dict.insert("A", 1);
        dict.insert("B", 2);
        dict.insert("C", 3);
        dict.insert("A", Number::from_i64(4));
        dict.remove(b"B");

        let keys = dict.keys().map(|k| k.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["A", "C"]);
        assert_eq!(dict.get(b"A").unwrap().as_i64(), Some(4));
    }

    #[test]
    fn kind_from_type() {
        let dict = dict_impl(b"<< /Type /Catalog /Pages 2 0 R >>").unwrap();
        assert_eq!(dict.kind(), DictKind::Catalog);
        assert_eq!(dict.get_name(TYPE), Some(&Name::new(b"Catalog")));
    }

    #[test]
    fn scale_only_arrays() {
        let mut dict = dict_impl(b"<< /MediaBox [0 0 100 200] /Rotate 90 >>").unwrap();
        dict.scale(0.5, 2.0);
        let media_box = dict.get(MEDIA_BOX).unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_f64(), Some(50.0));
        assert_eq!(media_box[3].as_f64(), Some(400.0));
        assert_eq!(dict.get(ROTATE).unwrap().as_i64(), Some(90));
    }
}
