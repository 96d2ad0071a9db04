use anyhow::Result;
use chrono::NaiveDate;
use std::{fmt, io::Write, sync::Arc};

use crate::{
    codec::encode_date,
    load::RowReader,
    table::{CompoundKey, Entity, TableSpec},
    write::RowWriter,
};

/// Weekly service pattern over a date range.
#[derive(Debug, Clone)]
pub struct Calendar {
    pub source_row: u64,
    pub service_id: Option<Arc<str>>,
    /// Monday first.
    pub days: [i32; 7],
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

const WEEKDAYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

impl Entity for Calendar {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<Arc<str>> {
        self.service_id.clone()
    }

    fn id(&self) -> Option<&str> {
        self.service_id.as_deref()
    }
}

pub struct CalendarTable;

impl TableSpec for CalendarTable {
    type Entity = Calendar;

    const NAME: &'static str = "calendar";
    const REQUIRED: bool = false;
    const KEY_FIELD: &'static str = "service_id";
    const COLUMNS: &'static [&'static str] = &[
        "service_id",
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
        "start_date",
        "end_date",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> Calendar {
        let service_id = row.string_field("service_id", true);
        let days = WEEKDAYS.map(|day| row.int_field(day, true, 0..=1));
        Calendar {
            source_row: row.row(),
            service_id,
            days,
            start_date: row.date_field("start_date", true),
            end_date: row.date_field("end_date", true),
        }
    }

    fn encode<W: Write>(&self, c: &Calendar, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(c.service_id.as_deref())?;
        for day in c.days {
            row.write_int(day)?;
        }
        row.write_date(c.start_date)?;
        row.write_date(c.end_date)
    }
}

/// Date part of a calendar exception key. Displays as it is written in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceDate(pub NaiveDate);

impl fmt::Display for ServiceDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encode_date(Some(self.0)))
    }
}

/// A single-day exception to a service pattern.
#[derive(Debug, Clone)]
pub struct CalendarDate {
    pub source_row: u64,
    pub service_id: Option<Arc<str>>,
    pub date: Option<NaiveDate>,
    /// 1 adds service on `date`, 2 removes it.
    pub exception_type: i32,
}

impl Entity for CalendarDate {
    type Key = CompoundKey<ServiceDate>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<CompoundKey<ServiceDate>> {
        Some(CompoundKey::new(self.service_id.clone()?, ServiceDate(self.date?)))
    }
}

pub struct CalendarDateTable;

impl TableSpec for CalendarDateTable {
    type Entity = CalendarDate;

    const NAME: &'static str = "calendar_dates";
    const REQUIRED: bool = false;
    const KEY_FIELD: &'static str = "service_id,date";
    const COLUMNS: &'static [&'static str] = &["service_id", "date", "exception_type"];

    fn decode(&self, row: &mut RowReader<'_>) -> CalendarDate {
        CalendarDate {
            source_row: row.row(),
            service_id: row.string_field("service_id", true),
            date: row.date_field("date", true),
            exception_type: row.int_field("exception_type", true, 1..=2),
        }
    }

    fn encode<W: Write>(&self, cd: &CalendarDate, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(cd.service_id.as_deref())?;
        row.write_date(cd.date)?;
        row.write_int(cd.exception_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostics::DiagnosticKind,
        session::FeedSession,
        testutil::{archive, zip_bytes},
    };

    #[test]
    fn weekday_flags_and_exceptions() -> Result<()> {
        let bytes = zip_bytes(&[
            (
                "calendar.txt",
                "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date\n\
                 WK,1,1,1,1,1,0,0,20240101,20241231\n\
                 WE,0,0,0,0,0,1,2,20240101,20241231\n",
            ),
            (
                "calendar_dates.txt",
                "service_id,date,exception_type\n\
                 WK,20241225,2\n\
                 WK,20241225,1\n\
                 WE,20240101,1\n",
            ),
        ])?;
        let session = FeedSession::default();
        let calendars = session.load(&mut archive(&bytes)?, &CalendarTable)?;
        let exceptions = session.load(&mut archive(&bytes)?, &CalendarDateTable)?;

        assert_eq!(calendars.get("WK").map(|c| c.days), Some([1, 1, 1, 1, 1, 0, 0]));
        assert_eq!(
            calendars.get("WK").and_then(|c| c.end_date),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
        // out-of-range flag is kept and reported
        assert_eq!(calendars.get("WE").map(|c| c.days[6]), Some(2));

        assert_eq!(exceptions.len(), 2);
        let christmas = CompoundKey::new(
            Arc::from("WK"),
            ServiceDate(NaiveDate::from_ymd_opt(2024, 12, 25).unwrap()),
        );
        assert_eq!(exceptions.get(&christmas).map(|cd| cd.exception_type), Some(1));

        let errors = session.errors().snapshot();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|d| d.table == "calendar"
            && d.column.as_deref() == Some("sunday")
            && matches!(d.kind, DiagnosticKind::Range { .. })));
        assert!(errors.iter().any(|d| d.kind
            == DiagnosticKind::DuplicateKey {
                key: "WK:20241225".into()
            }));
        Ok(())
    }
}
