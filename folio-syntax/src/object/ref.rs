//! References to indirect objects.

use crate::reader::{Readable, Reader, ReaderContext};
use std::fmt::{Debug, Display, Formatter};

/// The largest object number a PDF file may use.
pub const MAX_OBJECT_NUMBER: u32 = 8_388_607;

/// A reference to an object.
///
/// References are plain values: two references with the same numbers are the same reference.
#[derive(PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    /// The object number.
    pub obj_number: u32,
    /// The generation number.
    pub gen_number: u16,
}

impl ObjRef {
    /// Create a new object reference.
    pub const fn new(obj_number: u32, gen_number: u16) -> Self {
        Self {
            obj_number,
            gen_number,
        }
    }
}

impl Debug for ObjRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.obj_number, self.gen_number)
    }
}

impl Display for ObjRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.obj_number, self.gen_number)
    }
}

impl Readable for ObjRef {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        let obj_number = r.read::<u32>(ctx)?;
        r.skip_white_spaces_and_comments();
        let gen_number = r.read::<u16>(ctx)?;
        r.skip_white_spaces_and_comments();
        r.forward_tag(b"R")?;

        Some(Self::new(obj_number, gen_number))
    }
}
