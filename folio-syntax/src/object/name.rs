//! Names.

use crate::object::object;
use crate::reader::{Readable, Reader, ReaderContext};
use crate::trivia::is_regular_character;
use rustc_hash::FxHashSet;
use std::borrow::Borrow;
use std::fmt::{Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// A PDF name.
///
/// Names store their unescaped bytes, i.e. `/A#20B` is stored as `A B`. Cloning a name is cheap.
#[derive(Clone)]
pub struct Name(Arc<[u8]>);

impl Name {
    /// Create a new name from its unescaped bytes.
    pub fn new(data: &[u8]) -> Self {
        Self(Arc::from(data))
    }

    /// Create a new name from its escaped representation, as it would appear after the
    /// solidus in a PDF file.
    pub fn from_escaped(data: &[u8]) -> Option<Self> {
        Some(Self::new(&unescape(data)?))
    }

    /// Return a string representation of the name.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.deref()).unwrap_or("{non-ascii key}")
    }

    /// Return the unescaped bytes of the name.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Whether both names point to the same interned allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

// Must agree with the `Hash` impl of `[u8]`, so that maps keyed by `Name` can be
// queried with plain byte slices.
impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0[..].hash(state);
    }
}

impl Borrow<[u8]> for Name {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for Name {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for Name {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes())
    }
}

impl From<&[u8]> for Name {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

impl<const N: usize> From<&[u8; N]> for Name {
    fn from(value: &[u8; N]) -> Self {
        Self::new(value)
    }
}

impl From<&Self> for Name {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.as_str())
    }
}

object!(Name, Name);

impl Readable for Name {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        r.forward_tag(b"/")?;
        let start = r.offset();

        while let Some(b) = r.eat(is_regular_character) {
            if b == b'#' {
                r.eat(|n| n.is_ascii_hexdigit())?;
                r.eat(|n| n.is_ascii_hexdigit())?;
            }
        }

        let raw = r.range(start..r.offset())?;

        if raw.contains(&b'#') {
            Some(ctx.names.intern(&unescape(raw)?))
        } else {
            Some(ctx.names.intern(raw))
        }
    }
}

fn unescape(data: &[u8]) -> Option<Vec<u8>> {
    fn convert_hex(c: u8) -> Option<u8> {
        match c {
            b'A'..=b'F' => Some(c - b'A' + 10),
            b'a'..=b'f' => Some(c - b'a' + 10),
            b'0'..=b'9' => Some(c - b'0'),
            _ => None,
        }
    }

    let mut cleaned = Vec::with_capacity(data.len());
    let mut r = Reader::new(data);

    while let Some(b) = r.read_byte() {
        if b == b'#' {
            let hex = r.read_bytes(2)?;
            cleaned.push((convert_hex(hex[0])? << 4) | convert_hex(hex[1])?);
        } else {
            cleaned.push(b);
        }
    }

    Some(cleaned)
}

/// An interning pool for names.
///
/// Names that went through the same pool share their allocation, which makes equality checks
/// a pointer comparison in the common case. Names from different pools still compare by value.
#[derive(Clone, Default, Debug)]
pub struct NamePool {
    names: FxHashSet<Name>,
}

impl NamePool {
    /// Create a new, empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the interned name for the given unescaped bytes.
    pub fn intern(&mut self, bytes: &[u8]) -> Name {
        if let Some(name) = self.names.get(bytes) {
            return name.clone();
        }

        let name = Name::new(bytes);
        self.names.insert(name.clone());

        name
    }

    /// The number of distinct names in the pool.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
