//! Arrays.

use crate::object::{Number, Object, object};
use crate::reader::{Readable, Reader, ReaderContext};
use log::warn;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// An array of PDF objects.
#[derive(Clone, Default, PartialEq)]
pub struct Array(Vec<Object>);

impl Array {
    /// Create a new, empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object to the array.
    pub fn push(&mut self, obj: impl Into<Object>) {
        self.0.push(obj.into());
    }

    /// Consume the array, returning its items.
    pub fn into_inner(self) -> Vec<Object> {
        self.0
    }

    /// Scale the coordinates of the array.
    ///
    /// Numbers are treated as alternating x and y coordinates. Nested arrays are scaled
    /// independently, anything else is left as-is but still takes up a coordinate slot.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        for (i, item) in self.0.iter_mut().enumerate() {
            let factor = if i % 2 == 0 { sx } else { sy };

            match item {
                Object::Number(n) => *n = Number::from_f64(n.as_f64() * factor),
                Object::Array(a) => a.scale(sx, sy),
                _ => {}
            }
        }
    }
}

impl Deref for Array {
    type Target = Vec<Object>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Array {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Debug for Array {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T: Into<Object>> FromIterator<T> for Array {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for Array {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

object!(Array, Array);

impl Readable for Array {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        r.forward_tag(b"[")?;

        ctx.nested(|ctx| {
            let mut items = vec![];

            loop {
                r.skip_white_spaces_and_comments();

                if let Some(()) = r.forward_tag(b"]") {
                    return Some(Self(items));
                }

                if let Some(obj) = r.read::<Object>(ctx) {
                    items.push(obj);
                } else {
                    warn!("failed to read array item at offset {}", r.offset());
                    return None;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::object::{Array, Name, Number, ObjRef, Object};
    use crate::reader::Reader;

    fn array_impl(data: &[u8]) -> Option<Array> {
        Reader::new(data).read_without_context::<Array>()
    }

    #[test]
    fn empty_array_1() {
        assert!(array_impl(b"[]").unwrap().is_empty());
    }

    #[test]
    fn empty_array_2() {
        assert!(array_impl(b"[   \n]").unwrap().is_empty());
    }

    #[test]
    fn array_1() {
        let res = array_impl(b"[34]").unwrap();
        assert_eq!(res[0], Object::Number(Number::from_i64(34)));
    }

    #[test]
    fn array_2() {
        assert_eq!(array_impl(b"[true  ]").unwrap().len(), 1);
    }

    #[test]
    fn array_3() {
        assert_eq!(array_impl(b"[true \n false 34.564]").unwrap().len(), 3);
    }

    #[test]
    fn array_4() {
        let res = array_impl(b"[(A string.) << /Hi 34.35 >>]").unwrap();
        assert!(res[0].as_string().is_some());
        assert!(res[1].as_dict().is_some());
    }

    #[test]
    fn array_5() {
        let res = array_impl(b"[[32] /SomeName]").unwrap();
        assert_eq!(res[0].as_array().unwrap().len(), 1);
        assert_eq!(res[1], Object::Name(Name::new(b"SomeName")));
    }

    #[test]
    fn array_with_refs() {
        let res = array_impl(b"[1 0 R 2 0 R 1 0 R]").unwrap();
        assert_eq!(res.len(), 3);
        assert_eq!(res[2], Object::Ref(ObjRef::new(1, 0)));
    }

    #[test]
    fn array_with_comment() {
        assert_eq!(array_impl(b"[true % A comment \n false]").unwrap().len(), 2);
    }

    #[test]
    fn array_with_trailing() {
        assert_eq!(array_impl(b"[(Hi) /Test]trialing data").unwrap().len(), 2);
    }

    #[test]
    fn array_unterminated() {
        assert!(array_impl(b"[1 2 3").is_none());
    }

    #[test]
    fn array_too_deep() {
        let mut data = vec![b'['; 300];
        data.extend(vec![b']'; 300]);
        assert!(array_impl(&data).is_none());
    }

    #[test]
    fn scale_nested() {
        let mut arr = array_impl(b"[1 2 /Skip 4 [10 20]]").unwrap();
        arr.scale(2.0, 3.0);

        assert_eq!(arr[0].as_f64(), Some(2.0));
        assert_eq!(arr[1].as_f64(), Some(6.0));
        assert!(arr[2].as_name().is_some());
        assert_eq!(arr[3].as_f64(), Some(12.0));
        assert_eq!(arr[4].as_array().unwrap()[0].as_f64(), Some(20.0));
        assert_eq!(arr[4].as_array().unwrap()[1].as_f64(), Some(60.0));
    }
}
