use crate::filter::predictor::{PredictorParams, apply_predictor};
use crate::object::Dict;
use flate2::Compression;
use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::ZlibEncoder;
use log::warn;
use std::io::{Read, Write};

const COMPRESSION_LEVEL: u32 = 6;

pub(crate) fn decode(data: &[u8], params: Option<&Dict>) -> Option<Vec<u8>> {
    let decoded = zlib(data).or_else(|| deflate(data))?;
    apply_predictor(decoded, &PredictorParams::from_params(params))
}

pub(crate) fn encode(data: &[u8]) -> Vec<u8> {
    let mut e = ZlibEncoder::new(Vec::new(), Compression::new(COMPRESSION_LEVEL));
    // Writing into a vector can't fail.
    let _ = e.write_all(data);
    e.finish().unwrap_or_default()
}

fn zlib(data: &[u8]) -> Option<Vec<u8>> {
    read_lenient(ZlibDecoder::new(data))
}

fn deflate(data: &[u8]) -> Option<Vec<u8>> {
    read_lenient(DeflateDecoder::new(data))
}

/// Read the whole decoder, keeping whatever was decoded before a corrupt or truncated tail.
fn read_lenient(mut decoder: impl Read) -> Option<Vec<u8>> {
    let mut out = vec![];

    match decoder.read_to_end(&mut out) {
        Ok(_) => Some(out),
        Err(e) if !out.is_empty() => {
            warn!("flate stream is corrupt ({e}), using partially decoded data");

            Some(out)
        }
        Err(_) => None,
    }
}
