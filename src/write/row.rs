use anyhow::Result;
use chrono::NaiveDate;
use csv::{Terminator, WriterBuilder};
use std::io::Write;

use crate::codec::{self, FeedUrl};

/// Writes the fields of one table entry, one record at a time.
///
/// Holds the output by mutable borrow, so dropping it flushes but never closes the
/// archive the entry lives in.
pub struct RowWriter<'a, W: Write> {
    csv: csv::Writer<&'a mut W>,
}

impl<'a, W: Write> RowWriter<'a, W> {
    pub(crate) fn new(out: &'a mut W) -> Self {
        let csv = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        Self { csv }
    }

    pub(crate) fn write_header(&mut self, columns: &[&str]) -> Result<()> {
        self.csv.write_record(columns)?;
        Ok(())
    }

    /// Written verbatim; `None` becomes an empty field.
    pub fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        self.csv.write_field(value.unwrap_or_default())?;
        Ok(())
    }

    pub fn write_int(&mut self, value: i32) -> Result<()> {
        self.write_text(&codec::encode_int(value))
    }

    pub fn write_double(&mut self, value: f64) -> Result<()> {
        self.write_text(&codec::encode_double(value))
    }

    /// Seconds since midnight as `HH:MM:SS`.
    pub fn write_time(&mut self, secs_since_midnight: i32) -> Result<()> {
        self.write_text(&codec::encode_time(secs_since_midnight))
    }

    pub fn write_date(&mut self, value: Option<NaiveDate>) -> Result<()> {
        self.write_text(&codec::encode_date(value))
    }

    pub fn write_url(&mut self, value: Option<&FeedUrl>) -> Result<()> {
        self.write_text(&codec::encode_url(value))
    }

    pub fn end_record(&mut self) -> Result<()> {
        self.csv.write_record(None::<&[u8]>)?;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> Result<()> {
        self.csv.flush()?;
        Ok(())
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.csv.write_field(text)?;
        Ok(())
    }
}
