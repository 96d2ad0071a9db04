use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::INT_MISSING,
    load::RowReader,
    table::{CompoundKey, Entity, Table, TableSpec},
    write::RowWriter,
};

use super::trips::Trip;

/// Headway-based service for a trip between two times of day.
#[derive(Debug, Clone)]
pub struct Frequency {
    pub source_row: u64,
    pub trip_id: Option<Arc<str>>,
    pub start_time: i32,
    pub end_time: i32,
    pub headway_secs: i32,
    pub exact_times: i32,
}

impl Entity for Frequency {
    type Key = CompoundKey;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<CompoundKey> {
        let trip_id = self.trip_id.clone()?;
        (self.start_time != INT_MISSING).then(|| CompoundKey::new(trip_id, self.start_time))
    }

    fn sequence_number(&self) -> Option<i32> {
        (self.start_time != INT_MISSING).then_some(self.start_time)
    }
}

pub struct FrequencyTable<'a> {
    pub trips: &'a Table<Trip>,
}

impl TableSpec for FrequencyTable<'_> {
    type Entity = Frequency;

    const NAME: &'static str = "frequencies";
    const REQUIRED: bool = false;
    const KEY_FIELD: &'static str = "trip_id,start_time";
    const COLUMNS: &'static [&'static str] =
        &["trip_id", "start_time", "end_time", "headway_secs", "exact_times"];

    fn decode(&self, row: &mut RowReader<'_>) -> Frequency {
        Frequency {
            source_row: row.row(),
            trip_id: row.ref_field("trip_id", true, self.trips).key,
            start_time: row.time_field("start_time", true),
            end_time: row.time_field("end_time", true),
            headway_secs: row.int_field("headway_secs", true, 1..=86_400),
            exact_times: row.int_field_or("exact_times", false, 0..=1, 0),
        }
    }

    fn encode<W: Write>(&self, f: &Frequency, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(f.trip_id.as_deref())?;
        row.write_time(f.start_time)?;
        row.write_time(f.end_time)?;
        row.write_int(f.headway_secs)?;
        row.write_int(f.exact_times)
    }
}
