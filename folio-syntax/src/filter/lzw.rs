use crate::filter::predictor::{PredictorParams, apply_predictor};
use crate::object::Dict;
use log::warn;
use weezl::BitOrder;
use weezl::decode::Decoder;

pub(crate) fn decode(data: &[u8], params: Option<&Dict>) -> Option<Vec<u8>> {
    let params = PredictorParams::from_params(params);

    // With `EarlyChange` (the default), the code width grows one code early, which is
    // what TIFF does as well.
    let mut decoder = if params.early_change {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };

    let mut decoded = vec![];
    let result = decoder.into_vec(&mut decoded).decode(data);

    if let Err(e) = result.status {
        if decoded.is_empty() {
            warn!("failed to decode lzw stream: {e}");

            return None;
        }

        warn!("lzw stream is corrupt ({e}), using partially decoded data");
    }

    apply_predictor(decoded, &params)
}
