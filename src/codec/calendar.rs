use chrono::{Datelike, NaiveDate};
use std::ops::RangeInclusive;

use super::{Decoded, FieldProblem};

pub const YEARS: RangeInclusive<i32> = 2000..=2100;

/// Basic ISO calendar date `YYYYMMDD`. Years outside [`YEARS`] are flagged but kept.
pub fn decode_date(raw: &str) -> Decoded<Option<NaiveDate>> {
    match parse_basic_iso(raw) {
        Some(date) => {
            let mut decoded = Decoded::clean(Some(date));
            decoded.check_range(&YEARS, date.year());
            decoded
        }
        None => Decoded::failed(None, FieldProblem::DateParse),
    }
}

pub fn encode_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y%m%d").to_string())
        .unwrap_or_default()
}

fn parse_basic_iso(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
