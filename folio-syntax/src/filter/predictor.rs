//! Predictors for the Flate and LZW filters.

use crate::object::Dict;
use crate::object::dict::keys::{BITS_PER_COMPONENT, COLORS, COLUMNS, EARLY_CHANGE, PREDICTOR};
use log::warn;

pub(crate) struct PredictorParams {
    predictor: u8,
    colors: u8,
    bits_per_component: u8,
    columns: usize,
    pub(crate) early_change: bool,
}

impl PredictorParams {
    fn bits_per_pixel(&self) -> usize {
        usize::from(self.bits_per_component) * usize::from(self.colors)
    }

    /// The distance to the corresponding byte of the previous pixel, at least 1.
    fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel().div_ceil(8).max(1)
    }

    fn row_length_in_bytes(&self) -> usize {
        (self.columns * self.bits_per_pixel()).div_ceil(8)
    }

    pub(crate) fn from_params(dict: Option<&Dict>) -> Self {
        let Some(dict) = dict else {
            return Self::default();
        };

        Self {
            predictor: dict.get_as::<u8>(PREDICTOR).unwrap_or(1),
            colors: dict.get_as::<u8>(COLORS).unwrap_or(1).max(1),
            bits_per_component: dict.get_as::<u8>(BITS_PER_COMPONENT).unwrap_or(8),
            columns: dict.get_as::<usize>(COLUMNS).unwrap_or(1).max(1),
            early_change: dict.get_as::<u8>(EARLY_CHANGE).is_none_or(|e| e != 0),
        }
    }
}

impl Default for PredictorParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

pub(crate) fn apply_predictor(data: Vec<u8>, params: &PredictorParams) -> Option<Vec<u8>> {
    match params.predictor {
        1 => Some(data),
        2 => apply_tiff(data, params),
        10..=15 => apply_png(&data, params),
        p => {
            warn!("unknown predictor {p}");

            None
        }
    }
}

fn apply_png(data: &[u8], params: &PredictorParams) -> Option<Vec<u8>> {
    let row_len = params.row_length_in_bytes();
    let bpp = params.bytes_per_pixel();

    let mut out = Vec::with_capacity(data.len());
    let mut prev_row = vec![0; row_len];
    let mut cur_row = vec![0; row_len];

    // Each row starts with a byte indicating the algorithm used for that row.
    for chunk in data.chunks(row_len + 1) {
        let (&algorithm, row) = chunk.split_first()?;
        // Producers sometimes truncate the last row.
        let len = row.len();
        cur_row[..len].copy_from_slice(row);

        for i in 0..len {
            let left = if i >= bpp { cur_row[i - bpp] } else { 0 };
            let up = prev_row[i];
            let up_left = if i >= bpp { prev_row[i - bpp] } else { 0 };

            let prediction = match algorithm {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((u16::from(left) + u16::from(up)) / 2) as u8,
                4 => paeth(left, up, up_left),
                _ => {
                    warn!("unknown png predictor algorithm {algorithm}");

                    return None;
                }
            };

            cur_row[i] = cur_row[i].wrapping_add(prediction);
        }

        out.extend_from_slice(&cur_row[..len]);
        std::mem::swap(&mut prev_row, &mut cur_row);
    }

    Some(out)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn apply_tiff(mut data: Vec<u8>, params: &PredictorParams) -> Option<Vec<u8>> {
    let row_len = params.row_length_in_bytes();
    let colors = usize::from(params.colors);

    match params.bits_per_component {
        8 => {
            for row in data.chunks_mut(row_len) {
                for i in colors..row.len() {
                    row[i] = row[i].wrapping_add(row[i - colors]);
                }
            }
        }
        16 => {
            let step = colors * 2;

            for row in data.chunks_mut(row_len) {
                let mut i = step;
                while i + 1 < row.len() {
                    let prev = u16::from_be_bytes([row[i - step], row[i - step + 1]]);
                    let cur = u16::from_be_bytes([row[i], row[i + 1]]);
                    let [hi, lo] = cur.wrapping_add(prev).to_be_bytes();
                    row[i] = hi;
                    row[i + 1] = lo;
                    i += 2;
                }
            }
        }
        bpc => {
            warn!("tiff predictor with {bpc} bits per component is not supported");

            return None;
        }
    }

    Some(data)
}
