//! Decoding (and in the case of Flate, encoding) of stream data.

pub(crate) mod ascii_85;
pub(crate) mod ascii_hex;
pub(crate) mod flate;
pub(crate) mod lzw;
mod predictor;
pub(crate) mod run_length;

use crate::object::dict::keys::*;
use crate::object::{Dict, Name};
use log::warn;

/// Apply a single filter to `data`, using the given decode parameters.
pub fn apply_filter(data: &[u8], filter: Filter, params: Option<&Dict>) -> Option<Vec<u8>> {
    match filter {
        Filter::AsciiHexDecode => ascii_hex::decode(data),
        Filter::Ascii85Decode => ascii_85::decode(data),
        Filter::RunLengthDecode => run_length::decode(data),
        Filter::LzwDecode => lzw::decode(data, params),
        Filter::FlateDecode => flate::decode(data, params),
        // Image filters produce data in a format that only an image decoder can make sense
        // of, so they are never applied here.
        Filter::CcittFaxDecode
        | Filter::Jbig2Decode
        | Filter::DctDecode
        | Filter::JpxDecode
        | Filter::Crypt => None,
    }
}

/// A stream filter.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Filter {
    AsciiHexDecode,
    Ascii85Decode,
    LzwDecode,
    FlateDecode,
    RunLengthDecode,
    CcittFaxDecode,
    Jbig2Decode,
    DctDecode,
    JpxDecode,
    Crypt,
}

impl Filter {
    /// Look up a filter by its full or abbreviated name.
    pub fn from_name(name: &Name) -> Option<Self> {
        let filter = match name.as_bytes() {
            ASCII_HEX_DECODE | ASCII_HEX_DECODE_ABBREVIATION => Self::AsciiHexDecode,
            ASCII85_DECODE | ASCII85_DECODE_ABBREVIATION => Self::Ascii85Decode,
            LZW_DECODE | LZW_DECODE_ABBREVIATION => Self::LzwDecode,
            FLATE_DECODE | FLATE_DECODE_ABBREVIATION => Self::FlateDecode,
            RUN_LENGTH_DECODE | RUN_LENGTH_DECODE_ABBREVIATION => Self::RunLengthDecode,
            CCITTFAX_DECODE | CCITTFAX_DECODE_ABBREVIATION => Self::CcittFaxDecode,
            JBIG2_DECODE => Self::Jbig2Decode,
            DCT_DECODE | DCT_DECODE_ABBREVIATION => Self::DctDecode,
            JPX_DECODE => Self::JpxDecode,
            CRYPT => Self::Crypt,
            _ => {
                warn!("unknown filter: {}", name.as_str());

                return None;
            }
        };

        Some(filter)
    }

    /// Whether the filter encodes image data.
    pub fn is_image_filter(&self) -> bool {
        matches!(
            self,
            Self::CcittFaxDecode | Self::Jbig2Decode | Self::DctDecode | Self::JpxDecode
        )
    }

    pub(crate) fn debug_name(&self) -> &'static str {
        match self {
            Self::AsciiHexDecode => "ascii_hex",
            Self::Ascii85Decode => "ascii_85",
            Self::LzwDecode => "lzw",
            Self::FlateDecode => "flate",
            Self::RunLengthDecode => "run-length",
            Self::CcittFaxDecode => "ccit_fax",
            Self::Jbig2Decode => "jbig2",
            Self::DctDecode => "dct",
            Self::JpxDecode => "jpx",
            Self::Crypt => "crypt",
        }
    }
}
