//! Streams.

use crate::filter::{Filter, apply_filter, flate};
use crate::object::dict::keys::{DECODE_PARMS, DP, F, FILTER, FLATE_DECODE, LENGTH};
use crate::object::{Dict, Object, object};
use crate::util::OptionLog;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt::{Debug, Formatter};

/// A stream of arbitrary data.
///
/// The `/Length` entry of the dictionary is not kept in sync with the data automatically.
/// Streams created or modified through [`Stream::new`] or [`Stream::set_data`] remember that
/// their length is stale, and [`Stream::finalize_for_write`] fixes it up right before
/// serialization.
#[derive(Clone)]
pub struct Stream {
    dict: Dict,
    data: Vec<u8>,
    dirty_length: bool,
}

impl Stream {
    /// Create a new stream from a dictionary and its (already encoded) data.
    pub fn new(dict: Dict, data: Vec<u8>) -> Self {
        Self {
            dict,
            data,
            dirty_length: true,
        }
    }

    /// Create a stream whose dictionary is trusted to already describe the data.
    pub(crate) fn from_raw(dict: Dict, data: Vec<u8>) -> Self {
        Self {
            dict,
            data,
            dirty_length: false,
        }
    }

    /// Create a new stream that compresses `data` with the Flate filter.
    pub fn new_flate(mut dict: Dict, data: &[u8]) -> Self {
        dict.insert(FILTER, Object::Name(FLATE_DECODE.into()));
        dict.remove(DECODE_PARMS);

        Self::new(dict, flate::encode(data))
    }

    /// Returns the dictionary of the stream.
    pub fn dict(&self) -> &Dict {
        &self.dict
    }

    /// Returns the dictionary of the stream.
    pub fn dict_mut(&mut self) -> &mut Dict {
        &mut self.dict
    }

    /// Return the raw (potentially with some applied filters) data of the stream.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the raw data of the stream.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
        self.dirty_length = true;
    }

    /// Mark the `/Length` entry as stale, for example after repairing a broken stream.
    pub(crate) fn mark_length_dirty(&mut self) {
        self.dirty_length = true;
    }

    /// Consume the stream, returning its dictionary and raw data.
    pub fn into_parts(self) -> (Dict, Vec<u8>) {
        (self.dict, self.data)
    }

    /// Whether the dictionary has a `/Length` entry.
    pub fn has_length(&self) -> bool {
        self.dict.contains_key(LENGTH)
    }

    /// Bring the `/Length` entry up to date if the data changed since it was last set.
    pub fn finalize_for_write(&mut self) {
        if self.dirty_length {
            self.dict.insert(LENGTH, self.data.len());
            self.dirty_length = false;
        }
    }

    /// Whether the stream refers to its data in an external file.
    pub fn is_external(&self) -> bool {
        self.dict.contains_key(F)
    }

    /// Returns the filters of the stream, in the order in which they need to be applied for
    /// decoding.
    ///
    /// Returns `None` if any of the filters is unknown.
    pub fn filters(&self) -> Option<SmallVec<[Filter; 2]>> {
        match self.dict.get(FILTER) {
            Some(Object::Name(n)) => Filter::from_name(n).map(|f| SmallVec::from_elem(f, 1)),
            Some(Object::Array(a)) => a
                .iter()
                .map(|o| o.as_name().and_then(Filter::from_name))
                .collect(),
            _ => Some(SmallVec::new()),
        }
    }

    /// Return the decoded data of the stream.
    ///
    /// Filters for image formats are not applied; decoding stops at the first such filter and
    /// returns the data in the format it expects. Note that the result is not cached.
    pub fn decoded(&self) -> Option<Cow<'_, [u8]>> {
        let filters = self.filters()?;
        let params = self
            .dict
            .get(DECODE_PARMS)
            .or_else(|| self.dict.get(DP));
        let params_at = |i: usize| match params {
            Some(Object::Dict(d)) if i == 0 => Some(d),
            Some(Object::Array(a)) => a.get(i).and_then(Object::as_dict),
            _ => None,
        };

        let mut current = Cow::Borrowed(self.data.as_slice());

        for (i, filter) in filters.iter().enumerate() {
            if filter.is_image_filter() {
                break;
            }

            let new = apply_filter(current.as_ref(), *filter, params_at(i))
                .warn_none(&format!("failed to apply filter {}", filter.debug_name()))?;
            current = Cow::Owned(new);
        }

        Some(current)
    }
}

impl PartialEq for Stream {
    fn eq(&self, other: &Self) -> bool {
        self.dict == other.dict && self.data == other.data
    }
}

impl Debug for Stream {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stream {:?} (len: {})", self.dict, self.data.len())
    }
}

object!(Stream, Stream);
