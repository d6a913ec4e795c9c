//! Number objects.

use crate::object::{Object, ObjectLike, object};
use crate::reader::{Readable, Reader, ReaderContext};
use log::{debug, warn};
use std::fmt::Debug;
use std::str::FromStr;

/// The largest magnitude a number literal may have, `2^53 - 1`.
///
/// Integers up to this value are exactly representable as `f64`.
pub const MAX_NUMBER: i64 = 9_007_199_254_740_991;

/// A PDF number.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Number(pub(crate) InternalNumber);

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum InternalNumber {
    Real(f64),
    Integer(i64),
}

impl Number {
    /// Returns the number as a f64.
    pub fn as_f64(&self) -> f64 {
        match self.0 {
            InternalNumber::Real(r) => r,
            InternalNumber::Integer(i) => i as f64,
        }
    }

    /// Returns the number as an i64, truncating reals.
    pub fn as_i64(&self) -> i64 {
        match self.0 {
            InternalNumber::Real(r) => {
                let res = r as i64;

                if r.trunc() != r {
                    debug!("float {r} was truncated to {res}");
                }

                res
            }
            InternalNumber::Integer(i) => i,
        }
    }

    /// Whether the number was written as an integer.
    pub fn is_integer(&self) -> bool {
        matches!(self.0, InternalNumber::Integer(_))
    }

    /// Create a new `Number` from a f64 number.
    pub fn from_f64(num: f64) -> Self {
        Self(InternalNumber::Real(num))
    }

    /// Create a new `Number` from an i64 number.
    pub fn from_i64(num: i64) -> Self {
        Self(InternalNumber::Integer(num))
    }
}

object!(Number, Number);

impl Readable for Number {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        let start = r.offset();
        let mut is_real = false;

        // Some producers write things like `--5`, accept any number of leading signs.
        r.forward_while(|b| b == b'+' || b == b'-');

        match r.peek_byte()? {
            b'.' => {
                r.read_byte()?;
                r.forward_while_1(is_digit)?;
                is_real = true;
            }
            b'0'..=b'9' => {
                r.forward_while_1(is_digit)?;
                if let Some(()) = r.forward_tag(b".") {
                    r.forward_while(is_digit);
                    is_real = true;
                }
            }
            _ => return None,
        }

        let data = r.range(start..r.offset())?;
        let negative = data.iter().filter(|b| **b == b'-').count() % 2 == 1;
        let digits = std::str::from_utf8(data)
            .ok()?
            .trim_start_matches(['+', '-']);

        if is_real {
            let num = f64::from_str(digits).ok()?;
            let num = if negative { -num } else { num };

            if num.abs() > MAX_NUMBER as f64 {
                return if ctx.cap_numbers {
                    warn!("capped out-of-range number {num}");
                    Some(Self::from_f64(MAX_NUMBER as f64 * num.signum()))
                } else {
                    warn!("number {num} is out of range");
                    None
                };
            }

            Some(Self::from_f64(num))
        } else {
            match i64::from_str(digits) {
                Ok(num) if num <= MAX_NUMBER => {
                    Some(Self::from_i64(if negative { -num } else { num }))
                }
                _ if ctx.cap_numbers => {
                    warn!("capped out-of-range number {}", String::from_utf8_lossy(data));
                    Some(Self::from_i64(if negative { -MAX_NUMBER } else { MAX_NUMBER }))
                }
                _ => {
                    warn!("number {} is out of range", String::from_utf8_lossy(data));
                    None
                }
            }
        }
    }
}

macro_rules! int_num {
    ($i:ident) => {
        impl Readable for $i {
            fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<$i> {
                let num = r.read::<Number>(ctx)?;

                if !num.is_integer() {
                    return None;
                }

                num.as_i64().try_into().ok()
            }
        }

        impl ObjectLike<'_> for $i {
            const STATIC_NAME: &'static str = "Number";

            fn cast(obj: &Object) -> Option<Self> {
                match obj {
                    Object::Number(n) => n.as_i64().try_into().ok(),
                    _ => None,
                }
            }
        }

        impl From<$i> for Object {
            fn from(value: $i) -> Self {
                Object::Number(Number::from_i64(i64::try_from(value).unwrap_or(i64::MAX)))
            }
        }
    };
}

int_num!(i64);
int_num!(i32);
int_num!(u32);
int_num!(u16);
int_num!(u8);
int_num!(usize);

impl Readable for f64 {
    fn read(r: &mut Reader<'_>, ctx: &mut ReaderContext<'_>) -> Option<Self> {
        r.read::<Number>(ctx).map(|n| n.as_f64())
    }
}

impl ObjectLike<'_> for f64 {
    const STATIC_NAME: &'static str = "Number";

    fn cast(obj: &Object) -> Option<Self> {
        match obj {
            Object::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Number(Number::from_f64(value))
    }
}

impl From<f32> for Object {
    fn from(value: f32) -> Self {
        Self::Number(Number::from_f64(value as f64))
    }
}

pub(crate) fn is_digit(byte: u8) -> bool {
    byte.is_ascii_digit()
}
