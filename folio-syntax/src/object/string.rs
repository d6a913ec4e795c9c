//! Strings.

use crate::filter::ascii_hex::decode_hex_string;
use crate::object::{DateTime, object};
use crate::reader::{Readable, Reader, ReaderContext};
use crate::trivia::is_white_space_character;
use log::warn;
use std::fmt::{Debug, Formatter};

/// How a string is written in a PDF file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StringKind {
    /// A literal string, delimited by parentheses.
    Literal,
    /// A hex string, delimited by angle brackets.
    Hex,
}

/// A PDF string.
///
/// The string stores its decoded bytes, the kind only determines how it is written back.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PdfString {
    bytes: Vec<u8>,
    kind: StringKind,
}

impl PdfString {
    /// Create a new literal string.
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: StringKind::Literal,
        }
    }

    /// Create a new hex string.
    pub fn hex(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            kind: StringKind::Hex,
        }
    }

    /// Create a text string.
    ///
    /// ASCII text is stored as-is, everything else is encoded as UTF-16BE with a byte order
    /// mark.
    pub fn from_text(text: &str) -> Self {
        if text.is_ascii() {
            Self::literal(text.as_bytes())
        } else {
            let mut bytes = vec![0xfe, 0xff];
            for unit in text.encode_utf16() {
                bytes.extend(unit.to_be_bytes());
            }

            Self::hex(bytes)
        }
    }

    /// Create a date string.
    pub fn from_date(date: &DateTime) -> Self {
        Self::literal(date.to_pdf_string())
    }

    /// Returns the content of the string.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the kind of the string.
    pub fn kind(&self) -> StringKind {
        self.kind
    }

    /// Decode the string as a text string.
    ///
    /// Strings starting with a UTF-16BE byte order mark are decoded as such, everything else
    /// is interpreted byte by byte.
    pub fn to_text(&self) -> String {
        if let Some(utf16) = self.bytes.strip_prefix(&[0xfe, 0xff]) {
            let units = utf16
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect::<Vec<_>>();

            String::from_utf16_lossy(&units)
        } else if let Some(utf8) = self.bytes.strip_prefix(&[0xef, 0xbb, 0xbf]) {
            String::from_utf8_lossy(utf8).into_owned()
        } else {
            self.bytes.iter().map(|b| char::from(*b)).collect()
        }
    }

    /// Try to parse the string as a date.
    pub fn to_date(&self) -> Option<DateTime> {
        DateTime::from_bytes(&self.bytes)
    }
}

impl Debug for PdfString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            StringKind::Literal => write!(f, "({})", String::from_utf8_lossy(&self.bytes)),
            StringKind::Hex => {
                write!(f, "<")?;
                for b in &self.bytes {
                    write!(f, "{b:02X}")?;
                }
                write!(f, ">")
            }
        }
    }
}

object!(PdfString, String);

impl Readable for PdfString {
    fn read(r: &mut Reader<'_>, _: &mut ReaderContext<'_>) -> Option<Self> {
        match r.peek_byte()? {
            b'<' => read_hex(r).map(Self::hex),
            b'(' => read_literal(r).map(Self::literal),
            _ => None,
        }
    }
}

fn read_hex(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"<")?;
    let mut cleaned = vec![];

    while let Some(b) = r.peek_byte() {
        if b.is_ascii_hexdigit() {
            cleaned.push(b);
        } else if !is_white_space_character(b) {
            break;
        }

        r.forward();
    }
    r.forward_tag(b">")?;

    // An odd number of digits means the last one is padded with 0.
    if cleaned.len() % 2 != 0 {
        cleaned.push(b'0');
    }

    decode_hex_string(&cleaned).ok()
}

fn read_literal(r: &mut Reader<'_>) -> Option<Vec<u8>> {
    r.forward_tag(b"(")?;
    let mut bracket_counter = 1;
    let mut cleaned = vec![];

    loop {
        let byte = r.read_byte()?;

        match byte {
            b'\\' => {
                let next = r.read_byte()?;

                if is_octal_digit(next) {
                    let mut num = u32::from(next - b'0');

                    for _ in 0..2 {
                        match r.peek_byte() {
                            Some(n) if is_octal_digit(n) => {
                                num = num * 8 + u32::from(n - b'0');
                                r.forward();
                            }
                            _ => break,
                        }
                    }

                    if let Ok(num) = u8::try_from(num) {
                        cleaned.push(num);
                    } else {
                        warn!("overflow occurred while parsing octal literal string");
                        cleaned.push((num & 0xff) as u8);
                    }
                } else {
                    match next {
                        b'n' => cleaned.push(0xA),
                        b'r' => cleaned.push(0xD),
                        b't' => cleaned.push(0x9),
                        b'b' => cleaned.push(0x8),
                        b'f' => cleaned.push(0xC),
                        b'(' => cleaned.push(b'('),
                        b')' => cleaned.push(b')'),
                        b'\\' => cleaned.push(b'\\'),
                        // A backslash followed by an end-of-line marker continues the string
                        // on the next line.
                        b'\r' => {
                            if r.peek_byte() == Some(b'\n') {
                                r.forward();
                            }
                        }
                        b'\n' => {}
                        _ => cleaned.push(next),
                    }
                }
            }
            b'(' => {
                bracket_counter += 1;
                cleaned.push(byte);
            }
            b')' => {
                bracket_counter -= 1;

                if bracket_counter == 0 {
                    break;
                }

                cleaned.push(byte);
            }
            // An unescaped end-of-line marker is always read as a single line feed.
            b'\r' => {
                if r.peek_byte() == Some(b'\n') {
                    r.forward();
                }
                cleaned.push(b'\n');
            }
            other => cleaned.push(other),
        }
    }

    Some(cleaned)
}

fn is_octal_digit(byte: u8) -> bool {
    matches!(byte, b'0'..=b'7')
}
