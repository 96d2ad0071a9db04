use chrono::NaiveDate;
use csv::ByteRecord;
use std::{
    borrow::Cow,
    collections::{HashMap, HashSet},
    ops::RangeInclusive,
    sync::Arc,
};

use crate::{
    codec::{self, Decoded, FeedUrl, INT_MISSING},
    diagnostics::{Diagnostic, DiagnosticKind},
    session::FeedSession,
    table::{Entity, Table},
};

/// Outcome of a foreign-key lookup: the interned key text and the record it points at.
#[derive(Debug)]
pub struct Reference<'t, E> {
    pub key: Option<Arc<str>>,
    pub target: Option<&'t E>,
}

/// Typed access to the cells of the current row.
///
/// Every getter first checks presence: a column absent from the header is reported
/// once per table, an empty cell is reported on every row where the field is
/// required. Then the cell goes through its codec and any problems are recorded
/// against this row and column. Getters never fail; they fall back to the
/// missing sentinel of their type.
pub struct RowReader<'a> {
    session: &'a FeedSession,
    table: &'static str,
    row: u64,
    headers: &'a HashMap<String, usize>,
    record: &'a ByteRecord,
    missing_columns: &'a mut HashSet<String>,
}

impl<'a> RowReader<'a> {
    pub(crate) fn new(
        session: &'a FeedSession,
        table: &'static str,
        row: u64,
        headers: &'a HashMap<String, usize>,
        record: &'a ByteRecord,
        missing_columns: &'a mut HashSet<String>,
    ) -> Self {
        Self {
            session,
            table,
            row,
            headers,
            record,
            missing_columns,
        }
    }

    /// 1-based data row number, header excluded.
    pub fn row(&self) -> u64 {
        self.row
    }

    pub fn string_field(&mut self, column: &str, required: bool) -> Option<Arc<str>> {
        let raw = self.raw_field(column, required)?;
        Some(self.session.dedup().intern_str(&raw))
    }

    /// Integer in `range`; absent or empty cells give [`INT_MISSING`].
    pub fn int_field(&mut self, column: &str, required: bool, range: RangeInclusive<i32>) -> i32 {
        self.int_field_or(column, required, range, INT_MISSING)
    }

    /// Like [`Self::int_field`] but an absent or empty cell yields `default`. Malformed
    /// cells still yield [`INT_MISSING`].
    pub fn int_field_or(
        &mut self,
        column: &str,
        required: bool,
        range: RangeInclusive<i32>,
        default: i32,
    ) -> i32 {
        match self.raw_field(column, required) {
            Some(raw) => {
                let decoded = codec::decode_int(&raw, range);
                self.absorb(column, decoded)
            }
            None => default,
        }
    }

    /// Seconds since midnight from `HH:MM:SS`.
    pub fn time_field(&mut self, column: &str, required: bool) -> i32 {
        match self.raw_field(column, required) {
            Some(raw) => {
                let decoded = codec::decode_time(&raw);
                self.absorb(column, decoded)
            }
            None => INT_MISSING,
        }
    }

    pub fn date_field(&mut self, column: &str, required: bool) -> Option<NaiveDate> {
        let raw = self.raw_field(column, required)?;
        let decoded = codec::decode_date(&raw);
        self.absorb(column, decoded)
    }

    pub fn url_field(&mut self, column: &str, required: bool) -> Option<FeedUrl> {
        let raw = self.raw_field(column, required)?;
        let decoded = codec::decode_url(&raw);
        self.absorb(column, decoded)
    }

    /// NaN when absent, empty or unparsable.
    pub fn double_field(&mut self, column: &str, required: bool, range: RangeInclusive<f64>) -> f64 {
        match self.raw_field(column, required) {
            Some(raw) => {
                let decoded = codec::decode_double(&raw, range);
                self.absorb(column, decoded)
            }
            None => f64::NAN,
        }
    }

    /// Reads a foreign key and resolves it against `target`.
    ///
    /// Only the first time a `(column, value)` pair is seen in this session is it
    /// checked; a failed lookup is reported at that moment and never again.
    pub fn ref_field<'t, E>(
        &mut self,
        column: &str,
        required: bool,
        target: &'t Table<E>,
    ) -> Reference<'t, E>
    where
        E: Entity<Key = Arc<str>>,
    {
        let Some(raw) = self.raw_field(column, required) else {
            return Reference {
                key: None,
                target: None,
            };
        };
        let found = target.get(&*raw);
        if self.session.refs().first_sighting(column, &raw) && found.is_none() {
            self.report(
                column,
                DiagnosticKind::ReferentialIntegrity {
                    key: raw.to_string(),
                },
            );
        }
        Reference {
            key: Some(self.session.dedup().intern_str(&raw)),
            target: found,
        }
    }

    /// Presence check shared by every getter. `None` if the column is absent or the cell empty.
    fn raw_field(&mut self, column: &str, required: bool) -> Option<Cow<'a, str>> {
        let Some(&index) = self.headers.get(column) else {
            if !self.missing_columns.contains(column) {
                self.missing_columns.insert(column.to_owned());
                self.session
                    .errors()
                    .push(Diagnostic::at(self.table, 0, column, DiagnosticKind::MissingColumn));
            }
            return None;
        };
        let record: &'a ByteRecord = self.record;
        let cell = record.get(index).unwrap_or_default();
        if cell.is_empty() {
            if required {
                self.report(column, DiagnosticKind::EmptyField);
            }
            return None;
        }
        Some(String::from_utf8_lossy(cell))
    }

    fn absorb<T>(&self, column: &str, decoded: Decoded<T>) -> T {
        for problem in decoded.problems {
            self.report(column, problem.into());
        }
        decoded.value
    }

    fn report(&self, column: &str, kind: DiagnosticKind) {
        self.session
            .errors()
            .push(Diagnostic::at(self.table, self.row, column, kind));
    }
}
