//! Indirect objects.

use crate::object::dict::keys::LENGTH;
use crate::object::{Dict, MAX_OBJECT_NUMBER, ObjRef, Object, Stream};
use crate::reader::{Readable, Reader, ReaderContext};
use log::warn;

/// An object together with its identifier, as it appears in the body of a PDF file
/// (`N G obj ... endobj`).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IndirectObject {
    pub(crate) id: ObjRef,
    pub(crate) object: Object,
}

impl Readable for IndirectObject {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        let obj_number = r.read::<u32>(ctx)?;
        r.skip_white_spaces_and_comments();
        let gen_number = r.read::<u16>(ctx)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"obj")?;
        r.skip_white_spaces_and_comments();

        let id = ObjRef::new(obj_number, gen_number);

        if obj_number > MAX_OBJECT_NUMBER {
            warn!("object number of {id} is out of range");

            return None;
        }

        let object = if r.peek_tag(b"endobj").is_some() {
            warn!("object {id} is empty, treating it as null");
            Object::Null
        } else if r.peek_tag(b"<<").is_some() {
            let dict = r.read::<Dict>(ctx)?;
            let mut cloned = r.clone();
            cloned.skip_white_spaces_and_comments();

            if cloned.forward_tag(b"stream").is_some() {
                r.jump(cloned.offset());
                Object::Stream(read_stream_data(r, dict, id, ctx)?)
            } else {
                Object::Dict(dict)
            }
        } else {
            r.read::<Object>(ctx)?
        };

        r.skip_white_spaces_and_comments();

        if r.forward_tag(b"endobj").is_none() {
            // Missing `endobj` keywords are common enough in the wild that we accept them.
            warn!("object {id} is not terminated by endobj");
        }

        Some(Self { id, object })
    }
}

/// Read the data of a stream, with the reader positioned right after the `stream` keyword.
fn read_stream_data(
    r: &mut Reader<'_>,
    dict: Dict,
    id: ObjRef,
    ctx: &mut ReaderContext<'_>,
) -> Option<Stream> {
    // Some producers put spaces between the keyword and the end-of-line marker.
    r.forward_while(|b| b == b' ');
    r.read_eol();
    let start = r.offset();

    let mut length_is_stale = false;

    match dict.get(LENGTH) {
        Some(Object::Number(n)) => {
            if let Some(end) = usize::try_from(n.as_i64())
                .ok()
                .and_then(|len| start.checked_add(len))
            {
                let mut cloned = r.clone();
                cloned.jump(end);
                cloned.skip_white_spaces();

                if cloned.forward_tag(b"endstream").is_some() {
                    let data = r.range(start..end)?.to_vec();
                    r.jump(cloned.offset());

                    return Some(Stream::from_raw(dict, data));
                }
            }

            if !ctx.try_heuristic("stream length repair") {
                warn!("stream {id} has a wrong length");
                return None;
            }

            warn!("stream {id} has a wrong length, searching for endstream instead");
            length_is_stale = true;
        }
        // The length is stored in a separate object we can't resolve yet. Since the data is
        // delimited by scanning, the length is rewritten when serializing.
        Some(Object::Ref(_)) => length_is_stale = true,
        _ => {
            warn!("stream {id} has no length");
            length_is_stale = true;
        }
    }

    let keyword = r.find(b"endstream")?;
    let mut end = keyword;

    // The end-of-line marker before `endstream` is not part of the data.
    if end > start && r.range(end - 1..end)? == b"\n" {
        end -= 1;
    }
    if end > start && r.range(end - 1..end)? == b"\r" {
        end -= 1;
    }

    let data = r.range(start..end)?.to_vec();
    r.jump(keyword + b"endstream".len());

    let mut stream = Stream::from_raw(dict, data);
    if length_is_stale {
        stream.mark_length_dirty();
    }

    Some(stream)
}

#[cfg(test)]
mod tests {
    use crate::object::indirect::IndirectObject;
    use crate::object::dict::keys::LENGTH;
    use crate::object::{NamePool, ObjRef, Object};
    use crate::reader::{Reader, ReaderContext};

    fn read(data: &[u8]) -> Option<IndirectObject> {
        Reader::new(data).read_without_context::<IndirectObject>()
    }

    #[test]
    fn indirect_number() {
        let obj = read(b"12 0 obj\n34\nendobj").unwrap();
        assert_eq!(obj.id, ObjRef::new(12, 0));
        assert_eq!(obj.object.as_i64(), Some(34));
    }

    #[test]
    fn indirect_missing_endobj() {
        let obj = read(b"3 1 obj << /A 1 >>").unwrap();
        assert_eq!(obj.id, ObjRef::new(3, 1));
        assert!(obj.object.as_dict().is_some());
    }

    #[test]
    fn indirect_number_out_of_range() {
        assert!(read(b"4294967295 0 obj 1 endobj").is_none());
        assert!(read(b"8388608 0 obj 1 endobj").is_none());
        assert!(read(b"8388607 0 obj 1 endobj").is_some());
    }

    #[test]
    fn indirect_empty() {
        assert_eq!(read(b"3 0 obj endobj").unwrap().object, Object::Null);
    }

    #[test]
    fn stream_with_length() {
        let obj = read(b"1 0 obj\n<< /Length 5 >>\nstream\nhello\nendstream\nendobj").unwrap();
        assert_eq!(obj.object.as_stream().unwrap().raw_data(), b"hello");
    }

    #[test]
    fn stream_with_crlf() {
        let obj =
            read(b"1 0 obj\r\n<< /Length 5 >>\r\nstream\r\nhe\nlo\r\nendstream\r\nendobj").unwrap();
        assert_eq!(obj.object.as_stream().unwrap().raw_data(), b"he\nlo");
    }

    #[test]
    fn stream_with_wrong_length() {
        let mut obj =
            read(b"1 0 obj\n<< /Length 50 >>\nstream\nhello\nendstream\nendobj").unwrap();
        let Object::Stream(stream) = &mut obj.object else {
            panic!("expected a stream");
        };
        assert_eq!(stream.raw_data(), b"hello");

        stream.finalize_for_write();
        assert_eq!(stream.dict().get(LENGTH).unwrap().as_i64(), Some(5));
    }

    #[test]
    fn stream_with_indirect_length() {
        let obj = read(b"1 0 obj\n<< /Length 2 0 R >>\nstream\nhello\nendstream\nendobj").unwrap();
        assert_eq!(obj.object.as_stream().unwrap().raw_data(), b"hello");
    }

    #[test]
    fn stream_with_wrong_length_without_budget() {
        let mut names = NamePool::new();
        let mut ctx = ReaderContext::new(&mut names, false);
        ctx.heuristics = 0;

        assert!(
            Reader::new(b"1 0 obj\n<< /Length 50 >>\nstream\nhello\nendstream\nendobj")
                .read::<IndirectObject>(&mut ctx)
                .is_none()
        );
    }

    #[test]
    fn empty_stream() {
        let obj = read(b"1 0 obj\n<< /Length 0 >>\nstream\n\nendstream\nendobj").unwrap();
        assert!(obj.object.as_stream().unwrap().raw_data().is_empty());
    }

    #[test]
    fn binary_stream_containing_keyword_with_correct_length() {
        let obj = read(b"1 0 obj\n<< /Length 12 >>\nstream\nendstreamXYZ\nendstream\nendobj")
            .unwrap();
        assert_eq!(obj.object.as_stream().unwrap().raw_data(), b"endstreamXYZ");
    }
}
