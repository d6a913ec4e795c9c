//! Parsing and working with PDF objects.

use crate::reader::{Readable, Reader, ReaderContext};
use std::fmt::{Debug, Formatter};

mod array;
mod date;
pub mod dict;
mod indirect;
mod name;
mod number;
mod r#ref;
mod role;
mod stream;
mod string;

pub use array::Array;
pub use date::DateTime;
pub use dict::{Dict, keys};
pub(crate) use indirect::IndirectObject;
pub use name::{Name, NamePool};
pub(crate) use number::InternalNumber;
pub use number::{MAX_NUMBER, Number};
pub use r#ref::{MAX_OBJECT_NUMBER, ObjRef};
pub use role::{Catalog, DictKind, LinearizationParams, Page, PageTree};
pub use stream::Stream;
pub use string::{PdfString, StringKind};

/// A type that can be viewed from a borrowed [`Object`].
///
/// This is what powers typed lookups such as [`Context::lookup_as`](crate::Context::lookup_as).
pub trait ObjectLike<'a>: Sized {
    /// A human-readable name of the type, used in error messages.
    const STATIC_NAME: &'static str;

    /// Try to view the object as this type.
    fn cast(obj: &'a Object) -> Option<Self>;
}

macro_rules! object {
    ($t:ty, $s:ident) => {
        impl<'a> $crate::object::ObjectLike<'a> for &'a $t {
            const STATIC_NAME: &'static str = stringify!($s);

            fn cast(obj: &'a $crate::object::Object) -> Option<Self> {
                match obj {
                    $crate::object::Object::$s(v) => Some(v),
                    _ => None,
                }
            }
        }

        impl From<$t> for $crate::object::Object {
            fn from(value: $t) -> Self {
                $crate::object::Object::$s(value)
            }
        }
    };
}

pub(crate) use object;

/// A primitive PDF object.
#[derive(Clone, PartialEq, Default)]
pub enum Object {
    /// The null object.
    #[default]
    Null,
    /// A boolean object.
    Boolean(bool),
    /// A number object.
    Number(Number),
    /// A string object, either literal or hex-encoded.
    String(PdfString),
    /// A name object.
    Name(Name),
    /// An array object.
    Array(Array),
    /// A dictionary object.
    Dict(Dict),
    /// A stream object.
    // Can only be an indirect object in theory, but we treat it the same.
    Stream(Stream),
    /// A reference to an indirect object.
    Ref(ObjRef),
}

impl Object {
    /// Try viewing the object as a specific subtype.
    #[inline]
    pub fn cast<'a, T: ObjectLike<'a>>(&'a self) -> Option<T> {
        T::cast(self)
    }

    /// Returns the name of the variant, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Boolean(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Name(_) => "Name",
            Self::Array(_) => "Array",
            Self::Dict(_) => "Dict",
            Self::Stream(_) => "Stream",
            Self::Ref(_) => "Ref",
        }
    }

    /// Returns `true` if the object is the null object.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_dict(&self) -> Option<&Dict> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            _ => None,
        }
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_array(&self) -> Option<&Array> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_stream(&self) -> Option<&Stream> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_stream_mut(&mut self) -> Option<&mut Stream> {
        match self {
            Self::Stream(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_name(&self) -> Option<&Name> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_string(&self) -> Option<&PdfString> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_obj_ref(&self) -> Option<ObjRef> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_i64(&self) -> Option<i64> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_f64(&self) -> Option<f64> {
        self.cast()
    }

    #[inline]
    #[allow(missing_docs)]
    pub fn as_bool(&self) -> Option<bool> {
        self.cast()
    }

    /// Returns the dictionary of the object, if it is a dictionary or a stream.
    pub fn dict_like(&self) -> Option<&Dict> {
        match self {
            Self::Dict(d) => Some(d),
            Self::Stream(s) => Some(s.dict()),
            _ => None,
        }
    }

    /// Mutable version of [`Object::dict_like`].
    pub fn dict_like_mut(&mut self) -> Option<&mut Dict> {
        match self {
            Self::Dict(d) => Some(d),
            Self::Stream(s) => Some(s.dict_mut()),
            _ => None,
        }
    }

    /// Apply a geometric scale to the coordinates of the object.
    ///
    /// Numbers in arrays are treated as alternating x/y coordinates, nested arrays are scaled
    /// recursively, and for dictionaries all array values are scaled. Everything else is left
    /// untouched.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        match self {
            Self::Array(a) => a.scale(sx, sy),
            Self::Dict(d) => d.scale(sx, sy),
            _ => {}
        }
    }

    /// Call `f` with every reference that appears in the object, including nested ones.
    ///
    /// References are not resolved, so only the object itself is traversed.
    pub fn for_each_ref(&self, f: &mut impl FnMut(ObjRef)) {
        match self {
            Self::Ref(r) => f(*r),
            Self::Array(a) => a.iter().for_each(|o| o.for_each_ref(f)),
            Self::Dict(d) => d.values().for_each(|o| o.for_each_ref(f)),
            Self::Stream(s) => s.dict().values().for_each(|o| o.for_each_ref(f)),
            _ => {}
        }
    }
}

impl Debug for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Name(n) => write!(f, "{n:?}"),
            Self::Array(a) => write!(f, "{a:?}"),
            Self::Dict(d) => write!(f, "{d:?}"),
            Self::Stream(s) => write!(f, "{s:?}"),
            Self::Ref(r) => write!(f, "{r:?}"),
        }
    }
}

impl<'a> ObjectLike<'a> for &'a Object {
    const STATIC_NAME: &'static str = "Object";

    fn cast(obj: &'a Object) -> Option<Self> {
        Some(obj)
    }
}

impl ObjectLike<'_> for bool {
    const STATIC_NAME: &'static str = "Boolean";

    fn cast(obj: &Object) -> Option<Self> {
        match obj {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl ObjectLike<'_> for ObjRef {
    const STATIC_NAME: &'static str = "Ref";

    fn cast(obj: &Object) -> Option<Self> {
        match obj {
            Object::Ref(r) => Some(*r),
            _ => None,
        }
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<ObjRef> for Object {
    fn from(value: ObjRef) -> Self {
        Self::Ref(value)
    }
}

impl From<&str> for Object {
    /// Creates a name object.
    fn from(value: &str) -> Self {
        Self::Name(Name::from(value))
    }
}

impl<T: Into<Self>> From<Option<T>> for Object {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Object {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl Readable for Object {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        let object = match r.peek_byte()? {
            b'n' => {
                r.forward_tag(b"null")?;
                Self::Null
            }
            b't' => {
                r.forward_tag(b"true")?;
                Self::Boolean(true)
            }
            b'f' => {
                r.forward_tag(b"false")?;
                Self::Boolean(false)
            }
            b'/' => Self::Name(r.read::<Name>(ctx)?),
            b'<' => match r.peek_bytes(2)? {
                b"<<" => {
                    let dict = r.read::<Dict>(ctx)?;
                    let mut cloned = r.clone();
                    cloned.skip_white_spaces_and_comments();

                    // Streams are handled by the indirect object parser since their data can
                    // only be located with the help of the `endstream` keyword.
                    if cloned.peek_tag(b"stream").is_some() {
                        return None;
                    }

                    Self::Dict(dict)
                }
                _ => Self::String(r.read::<PdfString>(ctx)?),
            },
            b'(' => Self::String(r.read::<PdfString>(ctx)?),
            b'.' | b'+' | b'-' | b'0'..=b'9' => {
                if let Some(obj_ref) = r.read::<ObjRef>(ctx) {
                    Self::Ref(obj_ref)
                } else {
                    Self::Number(r.read::<Number>(ctx)?)
                }
            }
            b'[' => Self::Array(r.read::<Array>(ctx)?),
            _ => return None,
        };

        Some(object)
    }
}

/// Create a [`Dict`] from a list of key-value pairs.
///
/// ```
/// use folio_syntax::dict;
/// use folio_syntax::object::Object;
///
/// let dict = dict! {
///     "Type" => "Page",
///     "Rotate" => 90,
/// };
/// assert_eq!(dict.get(b"Rotate").and_then(Object::as_i64), Some(90));
/// ```
#[macro_export]
macro_rules! dict {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut dict = $crate::object::Dict::new();
        $(dict.insert($key, $value);)*
        dict
    }};
}

#[cfg(test)]
mod tests {
    use crate::object::{Name, Number, ObjRef, Object, PdfString};
    use crate::reader::Reader;

    fn object_impl(data: &[u8]) -> Option<Object> {
        let mut r = Reader::new(data);
        r.read_without_context::<Object>()
    }

    #[test]
    fn null() {
        assert_eq!(object_impl(b"null").unwrap(), Object::Null);
    }

    #[test]
    fn bool() {
        assert_eq!(object_impl(b"true").unwrap(), Object::Boolean(true));
        assert_eq!(object_impl(b"false").unwrap(), Object::Boolean(false));
    }

    #[test]
    fn number() {
        assert_eq!(
            object_impl(b"34.5").unwrap(),
            Object::Number(Number::from_f64(34.5))
        );
    }

    #[test]
    fn string_1() {
        assert_eq!(
            object_impl(b"(Hi)").unwrap(),
            Object::String(PdfString::literal(b"Hi".to_vec()))
        );
    }

    #[test]
    fn string_2() {
        assert_eq!(
            object_impl(b"<34>").unwrap(),
            Object::String(PdfString::hex(vec![0x34]))
        );
    }

    #[test]
    fn name() {
        assert_eq!(
            object_impl(b"/Name").unwrap(),
            Object::Name(Name::new(b"Name"))
        );
    }

    #[test]
    fn dict() {
        assert!(object_impl(b"<</Entry 45>>").unwrap().as_dict().is_some());
    }

    #[test]
    fn array() {
        assert!(object_impl(b"[45]").unwrap().as_array().is_some());
    }

    #[test]
    fn reference() {
        assert_eq!(
            object_impl(b"12 0 R").unwrap(),
            Object::Ref(ObjRef::new(12, 0))
        );
    }

    #[test]
    fn number_not_reference() {
        assert_eq!(
            object_impl(b"12 0 obj").unwrap(),
            Object::Number(Number::from_i64(12))
        );
    }

    #[test]
    fn stream_is_not_a_direct_object() {
        assert!(object_impl(b"<< /Length 3 >> stream\nabc\nendstream").is_none());
    }

    #[test]
    fn invalid() {
        assert!(object_impl(b"}").is_none());
    }

    #[test]
    fn for_each_ref_nested() {
        let obj = object_impl(b"<< /A 1 0 R /B [2 0 R << /C 3 0 R >>] >>").unwrap();
        let mut refs = vec![];
        obj.for_each_ref(&mut |r| refs.push(r.obj_number));
        assert_eq!(refs, vec![1, 2, 3]);
    }

    #[test]
    fn cast_mismatch() {
        assert!(Object::Boolean(true).as_dict().is_none());
        assert_eq!(Object::Boolean(true).as_bool(), Some(true));
    }
}
