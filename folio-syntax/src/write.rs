//! Serializing objects into their textual PDF representation.
//!
//! Every object knows its exact serialized size, which the writer relies on to compute
//! cross-reference offsets before emitting any bytes.

use crate::object::{
    Array, Dict, InternalNumber, Name, Number, ObjRef, Object, PdfString, Stream, StringKind,
};
use crate::trivia::is_delimiter_character;
use std::fmt::{self, Display};
use std::io::Write;

/// An object that can be written directly into a PDF file.
pub trait WriteDirect {
    /// The number of bytes [`WriteDirect::write_to`] will produce.
    fn size_in_bytes(&self) -> usize;

    /// Append the serialized object to `buf`.
    fn write_to(&self, buf: &mut Vec<u8>);

    /// Serialize the object into a new buffer.
    fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.size_in_bytes());
        self.write_to(&mut buf);
        buf
    }
}

impl WriteDirect for Object {
    fn size_in_bytes(&self) -> usize {
        match self {
            Self::Null => 4,
            Self::Boolean(b) => b.size_in_bytes(),
            Self::Number(n) => n.size_in_bytes(),
            Self::String(s) => s.size_in_bytes(),
            Self::Name(n) => n.size_in_bytes(),
            Self::Array(a) => a.size_in_bytes(),
            Self::Dict(d) => d.size_in_bytes(),
            Self::Stream(s) => s.size_in_bytes(),
            Self::Ref(r) => r.size_in_bytes(),
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Null => buf.extend_from_slice(b"null"),
            Self::Boolean(b) => b.write_to(buf),
            Self::Number(n) => n.write_to(buf),
            Self::String(s) => s.write_to(buf),
            Self::Name(n) => n.write_to(buf),
            Self::Array(a) => a.write_to(buf),
            Self::Dict(d) => d.write_to(buf),
            Self::Stream(s) => s.write_to(buf),
            Self::Ref(r) => r.write_to(buf),
        }
    }
}

impl WriteDirect for bool {
    fn size_in_bytes(&self) -> usize {
        if *self { 4 } else { 5 }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(if *self { b"true" } else { b"false" });
    }
}

/// The textual form of a number. Reals always carry a decimal point so that they are read
/// back as reals, and never use an exponent.
enum NumberRepr {
    Integer(i64),
    Real(f64),
    IntegralReal(f64),
}

impl NumberRepr {
    fn new(number: &Number) -> Self {
        match number.0 {
            InternalNumber::Integer(i) => Self::Integer(i),
            InternalNumber::Real(r) if !r.is_finite() => Self::Integer(0),
            InternalNumber::Real(r) if r.fract() == 0.0 => Self::IntegralReal(r),
            InternalNumber::Real(r) => Self::Real(r),
        }
    }
}

impl Display for NumberRepr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            // Adding zero turns `-0.0` into `0.0`.
            Self::IntegralReal(r) => write!(f, "{:.1}", r + 0.0),
            Self::Real(r) => write!(f, "{r}"),
        }
    }
}

impl WriteDirect for Number {
    fn size_in_bytes(&self) -> usize {
        display_len(&NumberRepr::new(self))
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        write_display(buf, &NumberRepr::new(self));
    }
}

impl WriteDirect for ObjRef {
    fn size_in_bytes(&self) -> usize {
        display_len(self)
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        write_display(buf, self);
    }
}

fn name_byte_needs_escape(b: u8) -> bool {
    !(b'!'..=b'~').contains(&b) || is_delimiter_character(b) || b == b'#'
}

impl WriteDirect for Name {
    fn size_in_bytes(&self) -> usize {
        1 + self
            .as_bytes()
            .iter()
            .map(|&b| if name_byte_needs_escape(b) { 3 } else { 1 })
            .sum::<usize>()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(b'/');

        for &b in self.as_bytes() {
            if name_byte_needs_escape(b) {
                buf.push(b'#');
                push_hex(buf, b);
            } else {
                buf.push(b);
            }
        }
    }
}

fn literal_escape(b: u8) -> Option<u8> {
    match b {
        b'\\' => Some(b'\\'),
        b'(' => Some(b'('),
        b')' => Some(b')'),
        b'\r' => Some(b'r'),
        b'\n' => Some(b'n'),
        _ => None,
    }
}

impl WriteDirect for PdfString {
    fn size_in_bytes(&self) -> usize {
        match self.kind() {
            StringKind::Literal => {
                2 + self
                    .as_bytes()
                    .iter()
                    .map(|&b| if literal_escape(b).is_some() { 2 } else { 1 })
                    .sum::<usize>()
            }
            StringKind::Hex => 2 + self.as_bytes().len() * 2,
        }
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        match self.kind() {
            StringKind::Literal => {
                buf.push(b'(');
                for &b in self.as_bytes() {
                    if let Some(escaped) = literal_escape(b) {
                        buf.extend_from_slice(&[b'\\', escaped]);
                    } else {
                        buf.push(b);
                    }
                }
                buf.push(b')');
            }
            StringKind::Hex => {
                buf.push(b'<');
                for &b in self.as_bytes() {
                    push_hex(buf, b);
                }
                buf.push(b'>');
            }
        }
    }
}

impl WriteDirect for Array {
    fn size_in_bytes(&self) -> usize {
        // Brackets plus one separator between each pair of items.
        2 + self.len().saturating_sub(1) + self.iter().map(|o| o.size_in_bytes()).sum::<usize>()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(b'[');
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                buf.push(b' ');
            }
            item.write_to(buf);
        }
        buf.push(b']');
    }
}

impl WriteDirect for Dict {
    fn size_in_bytes(&self) -> usize {
        // `<<`, then ` /Key value` for each entry, then ` >>`.
        5 + self
            .iter()
            .map(|(k, v)| 2 + k.size_in_bytes() + v.size_in_bytes())
            .sum::<usize>()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"<<");
        for (key, value) in self {
            buf.push(b' ');
            key.write_to(buf);
            buf.push(b' ');
            value.write_to(buf);
        }
        buf.extend_from_slice(b" >>");
    }
}

const STREAM_START: &[u8] = b"\nstream\n";
const STREAM_END: &[u8] = b"\nendstream";

impl WriteDirect for Stream {
    fn size_in_bytes(&self) -> usize {
        self.dict().size_in_bytes()
            + STREAM_START.len()
            + self.raw_data().len()
            + STREAM_END.len()
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        self.dict().write_to(buf);
        buf.extend_from_slice(STREAM_START);
        buf.extend_from_slice(self.raw_data());
        buf.extend_from_slice(STREAM_END);
    }
}

fn push_hex(buf: &mut Vec<u8>, b: u8) {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    buf.extend_from_slice(&[HEX[usize::from(b >> 4)], HEX[usize::from(b & 0xf)]]);
}

/// Counts the bytes of a formatted value without allocating.
struct Counter(usize);

impl fmt::Write for Counter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// The number of bytes `value` occupies when formatted.
pub fn display_len(value: &impl Display) -> usize {
    let mut counter = Counter(0);
    // Counting never fails.
    let _ = fmt::write(&mut counter, format_args!("{value}"));
    counter.0
}

/// Append a formatted value to `buf`.
pub fn write_display(buf: &mut Vec<u8>, value: &impl Display) {
    // Writing into a vector never fails.
    let _ = write!(buf, "{value}");
}

#[cfg(test)]
mod tests {
    use crate::dict;
    use crate::object::{Array, Name, Number, ObjRef, Object, PdfString, Stream};
    use crate::write::WriteDirect;

    fn check(obj: impl Into<Object>, expected: &[u8]) {
        let obj = obj.into();
        let bytes = obj.to_bytes();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            std::str::from_utf8(expected).unwrap()
        );
        assert_eq!(obj.size_in_bytes(), expected.len());
    }

    #[test]
    fn primitives() {
        check(Object::Null, b"null");
        check(true, b"true");
        check(false, b"false");
        check(ObjRef::new(12, 3), b"12 3 R");
    }

    #[test]
    fn numbers() {
        check(Number::from_i64(-42), b"-42");
        check(Number::from_f64(1.5), b"1.5");
        check(Number::from_f64(3.0), b"3.0");
        check(Number::from_f64(-0.0), b"0.0");
        check(Number::from_f64(0.25), b"0.25");
        check(Number::from_f64(1e21), b"1000000000000000000000.0");
        check(Number::from_f64(f64::NAN), b"0");
    }

    #[test]
    fn names() {
        check(Name::new(b"Type"), b"/Type");
        check(Name::new(b"A B"), b"/A#20B");
        check(Name::new(b"a#b(c)"), b"/a#23b#28c#29");
        check(Name::new(&[0xe9]), b"/#E9");
        check(Name::new(b""), b"/");
    }

    #[test]
    fn strings() {
        check(PdfString::literal(b"Hi (there)\\"), b"(Hi \\(there\\)\\\\)");
        check(PdfString::literal(b"a\r\nb"), b"(a\\r\\nb)");
        check(PdfString::hex(vec![0xfe, 0xff, 0x00, 0x41]), b"<FEFF0041>");
        check(PdfString::literal(b""), b"()");
    }

    #[test]
    fn arrays() {
        check(Array::new(), b"[]");
        check(
            vec![Object::from(1), Object::from("A"), Object::Null],
            b"[1 /A null]",
        );
    }

    #[test]
    fn dicts() {
        check(dict! {}, b"<< >>");
        check(
            dict! { "Type" => "Catalog", "Pages" => ObjRef::new(2, 0) },
            b"<< /Type /Catalog /Pages 2 0 R >>",
        );
        check(
            dict! { "A" => dict! { "B" => vec![1, 2] } },
            b"<< /A << /B [1 2] >> >>",
        );
    }

    #[test]
    fn streams() {
        check(
            Stream::new(dict! { "Length" => 3 }, b"abc".to_vec()),
            b"<< /Length 3 >>\nstream\nabc\nendstream",
        );
    }
}
