//! Expanding object streams.

use crate::object::dict::keys::{FIRST, N};
use crate::object::{ObjRef, Object, Stream};
use crate::reader::{Reader, ReaderContext};
use crate::util::OptionLog;
use log::warn;

/// Decode an object stream and return the objects it contains, in the order in which they
/// are listed in its header.
///
/// Objects that fail to parse are skipped.
pub(crate) fn expand(
    stream: &Stream,
    id: ObjRef,
    ctx: &mut ReaderContext<'_>,
) -> Option<Vec<(ObjRef, Object)>> {
    let num_objects = stream.dict().get_as::<usize>(N)?;
    let first_offset = stream.dict().get_as::<usize>(FIRST)?;

    let data = stream
        .decoded()
        .warn_none(&format!("failed to decode object stream {id}"))?;
    let mut r = Reader::new(data.as_ref());

    let mut offsets = vec![];

    for _ in 0..num_objects {
        r.skip_white_spaces_and_comments();
        let obj_number = r.read::<u32>(ctx)?;
        r.skip_white_spaces_and_comments();
        let relative_offset = r.read::<usize>(ctx)?;
        offsets.push((obj_number, first_offset.checked_add(relative_offset)?));
    }

    let mut objects = Vec::with_capacity(offsets.len());

    for (obj_number, offset) in offsets {
        r.jump(offset);
        r.skip_white_spaces_and_comments();

        match r.read::<Object>(ctx) {
            Some(object) => objects.push((ObjRef::new(obj_number, 0), object)),
            None => warn!("failed to read object {obj_number} from object stream {id}"),
        }
    }

    Some(objects)
}
