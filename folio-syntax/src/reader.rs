//! Reading bytes and PDF objects from data.

use crate::object::NamePool;
use crate::trivia::{is_eol_character, is_white_space_character};
use memchr::memmem;
use std::ops::Range;

/// Nesting limit for arrays and dictionaries.
pub(crate) const MAX_DEPTH: u16 = 256;

/// A reader for reading bytes and PDF objects.
#[derive(Clone, Debug)]
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    #[inline]
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub(crate) fn new_with(data: &'a [u8], offset: usize) -> Self {
        Self { data, offset }
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.offset >= self.data.len()
    }

    #[inline]
    pub(crate) fn jump_to_end(&mut self) {
        self.offset = self.data.len();
    }

    #[inline]
    pub(crate) fn jump(&mut self, offset: usize) {
        self.offset = offset;
    }

    #[inline]
    pub(crate) fn tail(&self) -> Option<&'a [u8]> {
        self.data.get(self.offset..)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub(crate) fn range(&self, range: Range<usize>) -> Option<&'a [u8]> {
        self.data.get(range)
    }

    #[inline]
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub(crate) fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let v = self.peek_bytes(len)?;
        self.offset += len;

        Some(v)
    }

    #[inline]
    pub(crate) fn read_byte(&mut self) -> Option<u8> {
        let v = self.peek_byte()?;
        self.offset += 1;

        Some(v)
    }

    #[inline]
    pub(crate) fn peek_bytes(&self, len: usize) -> Option<&'a [u8]> {
        self.data.get(self.offset..self.offset.checked_add(len)?)
    }

    #[inline]
    pub(crate) fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    /// Eat the next byte if it satisfies the condition.
    #[inline]
    pub(crate) fn eat(&mut self, f: impl Fn(u8) -> bool) -> Option<u8> {
        let val = self.peek_byte()?;
        if f(val) {
            self.forward();
            Some(val)
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn forward(&mut self) {
        self.offset += 1;
    }

    #[inline]
    pub(crate) fn forward_if(&mut self, f: impl Fn(u8) -> bool) -> Option<()> {
        if f(self.peek_byte()?) {
            self.forward();

            Some(())
        } else {
            None
        }
    }

    /// Advances the offset while bytes satisfy the predicate, at least one time.
    #[inline]
    pub(crate) fn forward_while_1(&mut self, f: impl Fn(u8) -> bool) -> Option<()> {
        self.eat(&f)?;
        self.forward_while(f);
        Some(())
    }

    #[inline]
    pub(crate) fn forward_tag(&mut self, tag: &[u8]) -> Option<()> {
        self.peek_tag(tag)?;
        self.offset += tag.len();

        Some(())
    }

    #[inline]
    pub(crate) fn forward_while(&mut self, f: impl Fn(u8) -> bool) {
        while let Some(b) = self.peek_byte() {
            if f(b) {
                self.forward();
            } else {
                break;
            }
        }
    }

    #[inline]
    pub(crate) fn peek_tag(&self, tag: &[u8]) -> Option<()> {
        if self.peek_bytes(tag.len())? == tag {
            Some(())
        } else {
            None
        }
    }

    /// Returns the absolute offset of the next occurrence of `needle`, starting at the
    /// current offset.
    pub(crate) fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.tail()?, needle).map(|pos| self.offset + pos)
    }

    /// Read an object, restoring the old offset if it doesn't match.
    #[inline]
    pub(crate) fn read<T: Readable>(&mut self, ctx: &mut ReaderContext<'_>) -> Option<T> {
        let old_offset = self.offset;

        T::read(self, ctx).or_else(|| {
            self.offset = old_offset;

            None
        })
    }

    /// Read an object with a throwaway name pool and default settings.
    pub(crate) fn read_without_context<T: Readable>(&mut self) -> Option<T> {
        let mut names = NamePool::default();
        self.read::<T>(&mut ReaderContext::new(&mut names, false))
    }

    #[inline]
    pub(crate) fn skip_white_spaces(&mut self) {
        self.forward_while(is_white_space_character);
    }

    /// Read a single end-of-line marker (`\r`, `\n` or `\r\n`).
    #[inline]
    pub(crate) fn read_eol(&mut self) -> Option<()> {
        match self.peek_byte()? {
            b'\n' => {
                self.forward();
                Some(())
            }
            b'\r' => {
                self.forward();
                if self.peek_byte() == Some(b'\n') {
                    self.forward();
                }
                Some(())
            }
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn skip_eol_characters(&mut self) {
        self.forward_while(is_eol_character);
    }

    #[inline]
    pub(crate) fn skip_white_spaces_and_comments(&mut self) {
        while let Some(b) = self.peek_byte() {
            if is_white_space_character(b) {
                self.skip_white_spaces();
            } else if b == b'%' {
                self.skip_comment();
            } else {
                return;
            }
        }
    }

    #[inline]
    pub(crate) fn skip_comment(&mut self) {
        if self.forward_tag(b"%").is_some() {
            self.forward_while(|b| !is_eol_character(b));
        }
    }
}

/// State shared by all element parsers of one parse session.
pub(crate) struct ReaderContext<'c> {
    pub(crate) names: &'c mut NamePool,
    pub(crate) cap_numbers: bool,
    pub(crate) depth: u16,
    /// How many more costly repair heuristics may be attempted.
    pub(crate) heuristics: usize,
}

impl<'c> ReaderContext<'c> {
    pub(crate) fn new(names: &'c mut NamePool, cap_numbers: bool) -> Self {
        Self {
            names,
            cap_numbers,
            depth: 0,
            heuristics: usize::MAX,
        }
    }

    /// Consume one unit of the heuristic budget, returning `false` if it is exhausted.
    pub(crate) fn try_heuristic(&mut self, what: &str) -> bool {
        if self.heuristics == 0 {
            log::debug!("not attempting {what}, heuristic budget is exhausted");

            false
        } else {
            self.heuristics -= 1;

            true
        }
    }

    /// Run `f` one nesting level deeper, failing once the nesting limit is reached.
    pub(crate) fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        if self.depth >= MAX_DEPTH {
            log::warn!("exceeded maximum nesting depth of {MAX_DEPTH}");
            return None;
        }

        self.depth += 1;
        let res = f(self);
        self.depth -= 1;

        res
    }
}

/// An element that can be read from a byte stream.
///
/// Implementations return `None` if the input doesn't match. They may leave the reader at an
/// arbitrary position in that case, [`Reader::read`] takes care of restoring it.
pub(crate) trait Readable: Sized {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self>;
}
