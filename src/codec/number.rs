use std::ops::RangeInclusive;

use super::{Decoded, FieldProblem};

/// Stored in integer fields that were absent, empty or unparsable.
pub const INT_MISSING: i32 = i32::MIN;

/// Plain decimal integer. Out-of-range values are kept and flagged.
pub fn decode_int(raw: &str, range: RangeInclusive<i32>) -> Decoded<i32> {
    match raw.parse::<i32>() {
        Ok(value) => {
            let mut decoded = Decoded::clean(value);
            decoded.check_range(&range, value);
            decoded
        }
        Err(_) => Decoded::failed(INT_MISSING, FieldProblem::NumberParse),
    }
}

pub fn encode_int(value: i32) -> String {
    if value == INT_MISSING {
        String::new()
    } else {
        value.to_string()
    }
}

/// Decimal floating point, NaN when unparsable. Out-of-range values are kept and flagged.
///
/// Only finite values are accepted: `inf`, `NaN` and literals that overflow to
/// infinity are parse problems, since NaN is the missing sentinel.
pub fn decode_double(raw: &str, range: RangeInclusive<f64>) -> Decoded<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let mut decoded = Decoded::clean(value);
            decoded.check_range(&range, value);
            decoded
        }
        _ => Decoded::failed(f64::NAN, FieldProblem::NumberParse),
    }
}

/// Seven fractional digits, `.` separator, never scientific notation. NaN is written empty.
///
/// One ten-millionth of a degree is about 1.1cm at the equator, which bounds file size
/// without losing useful precision on coordinates.
pub fn encode_double(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{:.7}", value)
    }
}
