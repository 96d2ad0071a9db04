//! Conversions between cell text and typed values.
//!
//! Every decoder takes the raw, non-empty text of a single cell and never fails:
//! problems are collected on the returned [`Decoded`] and the value falls back to
//! the type's missing sentinel. Presence checks (absent column, empty cell) are
//! the caller's job, see [`crate::load::RowReader`].
//!
//! Encoders are the exact inverse and turn missing sentinels into empty text.

mod calendar;
mod number;
mod text;
mod time;

use std::ops::RangeInclusive;

pub use calendar::{decode_date, encode_date, YEARS};
pub use number::{decode_double, decode_int, encode_double, encode_int, INT_MISSING};
pub use text::{decode_url, encode_url, FeedUrl};
pub use time::{decode_time, encode_time, HOURS, MINUTES, SECONDS};

/// Something wrong with a single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldProblem {
    NumberParse,
    TimeParse,
    DateParse,
    UrlParse,
    /// Value parsed but lies outside the inclusive bounds. The value is kept.
    Range { min: f64, max: f64, actual: f64 },
}

/// A decoded value and the problems found while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub value: T,
    pub problems: Vec<FieldProblem>,
}

impl<T> Decoded<T> {
    pub(crate) fn clean(value: T) -> Self {
        Self {
            value,
            problems: Vec::new(),
        }
    }

    pub(crate) fn failed(value: T, problem: FieldProblem) -> Self {
        Self {
            value,
            problems: vec![problem],
        }
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    /// Records a `Range` problem if `actual` is outside `range`. Returns whether it was inside.
    pub(crate) fn check_range<N>(&mut self, range: &RangeInclusive<N>, actual: N) -> bool
    where
        N: Into<f64> + PartialOrd + Copy,
    {
        if range.contains(&actual) {
            return true;
        }
        self.problems.push(FieldProblem::Range {
            min: (*range.start()).into(),
            max: (*range.end()).into(),
            actual: actual.into(),
        });
        false
    }
}
