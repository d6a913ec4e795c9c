//! Cross-reference tables and streams.
//!
//! Objects are located by scanning the body of each update layer, so cross-reference data is
//! only decoded to describe the layer, never to seek.

use crate::object::dict::keys::{INDEX, SIZE, W};
use crate::object::{Array, Stream};
use crate::reader::{Readable, Reader, ReaderContext};
use log::warn;
use smallvec::SmallVec;

/// The length of an entry in a cross-reference table, including its end-of-line marker.
pub const XREF_ENTRY_LEN: usize = 20;

/// An entry of a cross-reference section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// A free entry.
    Free {
        /// The number of the next free object.
        next: u32,
        /// The generation number to use if the object number is reused.
        gen_number: u16,
    },
    /// An object stored uncompressed in the body.
    InUse {
        /// The byte offset of the object.
        offset: usize,
        /// The generation number of the object.
        gen_number: u16,
    },
    /// An object stored in an object stream.
    Compressed {
        /// The object number of the object stream.
        stream: u32,
        /// The index of the object within the stream.
        index: u32,
    },
}

/// The decoded entries of a cross-reference section, keyed by object number.
pub type XRefEntries = Vec<(u32, XRefEntry)>;

struct SubsectionHeader {
    start: u32,
    num_entries: u32,
}

impl Readable for SubsectionHeader {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        r.skip_white_spaces();
        let start = r.read::<u32>(ctx)?;
        r.skip_white_spaces();
        let num_entries = r.read::<u32>(ctx)?;
        r.skip_white_spaces();

        Some(Self { start, num_entries })
    }
}

fn read_table_entry(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<XRefEntry> {
    r.skip_white_spaces();
    let first = r.read::<usize>(ctx)?;
    r.skip_white_spaces();
    let gen_number = r.read::<u16>(ctx)?;
    r.skip_white_spaces();

    let entry = match r.read_byte()? {
        b'n' => XRefEntry::InUse {
            offset: first,
            gen_number,
        },
        b'f' => XRefEntry::Free {
            next: u32::try_from(first).ok()?,
            gen_number,
        },
        _ => return None,
    };

    // Entries are supposed to be exactly 20 bytes long, but producers regularly get the
    // end-of-line marker wrong, so we don't rely on it.
    r.forward_while(|b| b == b' ');
    r.skip_eol_characters();

    Some(entry)
}

/// Read a cross-reference table, starting at the `xref` keyword.
pub(crate) fn read_xref_table(
    r: &mut Reader<'_>,
    ctx: &mut ReaderContext<'_>,
) -> Option<XRefEntries> {
    r.forward_tag(b"xref")?;

    let mut entries = vec![];

    while let Some(header) = r.read::<SubsectionHeader>(ctx) {
        for i in 0..header.num_entries {
            let entry = read_table_entry(r, ctx)?;
            entries.push((header.start.checked_add(i)?, entry));
        }
    }

    Some(entries)
}

/// Decode the entries of a cross-reference stream.
pub fn decode_xref_stream(stream: &Stream) -> Option<XRefEntries> {
    let dict = stream.dict();
    let size = dict.get_as::<u32>(SIZE)?;

    let widths = dict
        .get_as::<&Array>(W)?
        .iter()
        .map(|o| o.as_i64().and_then(|n| usize::try_from(n).ok()))
        .collect::<Option<SmallVec<[usize; 3]>>>()?;

    let [f1_len, f2_len, f3_len] = widths.as_slice() else {
        warn!("xref stream has an invalid /W entry");

        return None;
    };

    if [f1_len, f2_len, f3_len].iter().any(|l| **l > size_of::<u64>()) {
        warn!("xref stream field is larger than the allowed limit");

        return None;
    }

    let subsections = match dict.get_as::<&Array>(INDEX) {
        Some(index) => index
            .chunks_exact(2)
            .map(|pair| {
                let start = u32::try_from(pair[0].as_i64()?).ok()?;
                let count = u32::try_from(pair[1].as_i64()?).ok()?;

                Some((start, count))
            })
            .collect::<Option<Vec<_>>>()?,
        None => vec![(0, size)],
    };

    let data = stream.decoded()?;
    let mut r = Reader::new(data.as_ref());
    let mut entries = vec![];

    for (start, count) in subsections {
        for i in 0..count {
            let f_type = if *f1_len == 0 {
                1
            } else {
                read_field(&mut r, *f1_len)?
            };
            let f2 = read_field(&mut r, *f2_len)?;
            let f3 = read_field(&mut r, *f3_len)?;
            let obj_number = start.checked_add(i)?;

            let entry = match f_type {
                0 => XRefEntry::Free {
                    next: u32::try_from(f2).ok()?,
                    gen_number: u16::try_from(f3).ok()?,
                },
                1 => XRefEntry::InUse {
                    offset: usize::try_from(f2).ok()?,
                    gen_number: u16::try_from(f3).ok()?,
                },
                2 => XRefEntry::Compressed {
                    stream: u32::try_from(f2).ok()?,
                    index: u32::try_from(f3).ok()?,
                },
                // Unknown types are to be treated as references to the null object.
                _ => continue,
            };

            entries.push((obj_number, entry));
        }
    }

    Some(entries)
}

/// Read a big-endian field. A field of width zero has the value zero.
fn read_field(r: &mut Reader<'_>, len: usize) -> Option<u64> {
    Some(
        r.read_bytes(len)?
            .iter()
            .fold(0, |acc, b| (acc << 8) | u64::from(*b)),
    )
}

/// The minimum number of bytes needed to store `value` in a cross-reference stream field.
pub fn field_width(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()).div_ceil(8).max(1) as usize
}

#[cfg(test)]
mod tests {
    use crate::dict;
    use crate::object::Stream;
    use crate::reader::Reader;
    use crate::xref::{XRefEntry, decode_xref_stream, field_width, read_xref_table};

    fn table(data: &[u8]) -> Option<Vec<(u32, XRefEntry)>> {
        let mut names = crate::object::NamePool::new();
        let mut ctx = crate::reader::ReaderContext::new(&mut names, false);
        read_xref_table(&mut Reader::new(data), &mut ctx)
    }

    #[test]
    fn classic_table() {
        let entries = table(
            b"xref\n0 3\n0000000000 65535 f \n0000000015 00000 n \n0000000079 00002 n \ntrailer",
        )
        .unwrap();

        assert_eq!(
            entries,
            vec![
                (
                    0,
                    XRefEntry::Free {
                        next: 0,
                        gen_number: 65535
                    }
                ),
                (
                    1,
                    XRefEntry::InUse {
                        offset: 15,
                        gen_number: 0
                    }
                ),
                (
                    2,
                    XRefEntry::InUse {
                        offset: 79,
                        gen_number: 2
                    }
                ),
            ]
        );
    }

    #[test]
    fn multiple_subsections_with_bad_eol() {
        let entries =
            table(b"xref\r\n0 1\r\n0000000000 65535 f\r\n4 1\n0000000100 00000 n\n\ntrailer")
                .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].0, 4);
    }

    #[test]
    fn truncated_table() {
        assert!(table(b"xref\n0 2\n0000000000 65535 f \n").is_none());
    }

    #[test]
    fn xref_stream() {
        let data = vec![
            0, 0, 0, 0xff, //
            1, 0, 0x10, 0, //
            2, 0, 0x05, 1,
        ];
        let stream = Stream::new(
            dict! {
                "Type" => "XRef",
                "Size" => 8,
                "W" => vec![1, 2, 1],
                "Index" => vec![0, 1, 6, 2],
            },
            data,
        );

        let entries = decode_xref_stream(&stream).unwrap();
        assert_eq!(
            entries,
            vec![
                (
                    0,
                    XRefEntry::Free {
                        next: 0,
                        gen_number: 255
                    }
                ),
                (
                    6,
                    XRefEntry::InUse {
                        offset: 16,
                        gen_number: 0
                    }
                ),
                (7, XRefEntry::Compressed { stream: 5, index: 1 }),
            ]
        );
    }

    #[test]
    fn xref_stream_default_type() {
        let stream = Stream::new(
            dict! { "Size" => 1, "W" => vec![0, 1, 0] },
            vec![42],
        );
        assert_eq!(
            decode_xref_stream(&stream).unwrap(),
            vec![(
                0,
                XRefEntry::InUse {
                    offset: 42,
                    gen_number: 0
                }
            )]
        );
    }

    #[test]
    fn widths() {
        assert_eq!(field_width(0), 1);
        assert_eq!(field_width(255), 1);
        assert_eq!(field_width(256), 2);
        assert_eq!(field_width(1 << 32), 5);
    }
}
