use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::INT_MISSING,
    load::RowReader,
    table::{CompoundKey, Entity, Table, TableSpec},
    write::RowWriter,
};

use super::{stops::Stop, trips::Trip};

/// A visit of a trip to a stop. Identified by the trip and the position within it.
#[derive(Debug, Clone)]
pub struct StopTime {
    pub source_row: u64,
    pub trip_id: Option<Arc<str>>,
    pub arrival_time: i32,
    pub departure_time: i32,
    pub stop_id: Option<Arc<str>>,
    pub stop_sequence: i32,
    pub stop_headsign: Option<Arc<str>>,
    pub pickup_type: i32,
    pub drop_off_type: i32,
    pub shape_dist_traveled: f64,
    pub timepoint: i32,
}

impl Entity for StopTime {
    type Key = CompoundKey;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<CompoundKey> {
        let trip_id = self.trip_id.clone()?;
        (self.stop_sequence != INT_MISSING).then(|| CompoundKey::new(trip_id, self.stop_sequence))
    }

    fn sequence_number(&self) -> Option<i32> {
        (self.stop_sequence != INT_MISSING).then_some(self.stop_sequence)
    }
}

pub struct StopTimeTable<'a> {
    pub trips: &'a Table<Trip>,
    pub stops: &'a Table<Stop>,
}

impl TableSpec for StopTimeTable<'_> {
    type Entity = StopTime;

    const NAME: &'static str = "stop_times";
    const REQUIRED: bool = true;
    const KEY_FIELD: &'static str = "trip_id,stop_sequence";
    const COLUMNS: &'static [&'static str] = &[
        "trip_id",
        "arrival_time",
        "departure_time",
        "stop_id",
        "stop_sequence",
        "stop_headsign",
        "pickup_type",
        "drop_off_type",
        "shape_dist_traveled",
        "timepoint",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> StopTime {
        StopTime {
            source_row: row.row(),
            trip_id: row.ref_field("trip_id", true, self.trips).key,
            // only timepoints need explicit times
            arrival_time: row.time_field("arrival_time", false),
            departure_time: row.time_field("departure_time", false),
            stop_id: row.ref_field("stop_id", true, self.stops).key,
            stop_sequence: row.int_field("stop_sequence", true, 0..=i32::MAX),
            stop_headsign: row.string_field("stop_headsign", false),
            pickup_type: row.int_field("pickup_type", false, 0..=3),
            drop_off_type: row.int_field("drop_off_type", false, 0..=3),
            shape_dist_traveled: row.double_field("shape_dist_traveled", false, 0.0..=f64::MAX),
            timepoint: row.int_field("timepoint", false, 0..=1),
        }
    }

    fn encode<W: Write>(&self, st: &StopTime, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(st.trip_id.as_deref())?;
        row.write_time(st.arrival_time)?;
        row.write_time(st.departure_time)?;
        row.write_string(st.stop_id.as_deref())?;
        row.write_int(st.stop_sequence)?;
        row.write_string(st.stop_headsign.as_deref())?;
        row.write_int(st.pickup_type)?;
        row.write_int(st.drop_off_type)?;
        row.write_double(st.shape_dist_traveled)?;
        row.write_int(st.timepoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop_time(seq: i32) -> StopTime {
        StopTime {
            source_row: 1,
            trip_id: Some(Arc::from("T1")),
            arrival_time: 28_800,
            departure_time: 28_860,
            stop_id: Some(Arc::from("S1")),
            stop_sequence: seq,
            stop_headsign: None,
            pickup_type: INT_MISSING,
            drop_off_type: INT_MISSING,
            shape_dist_traveled: f64::NAN,
            timepoint: INT_MISSING,
        }
    }

    #[test]
    fn keyed_by_trip_and_sequence() {
        let st = stop_time(4);
        assert_eq!(st.key(), Some(CompoundKey::new(Arc::from("T1"), 4)));
        assert_eq!(st.sequence_number(), Some(4));
        assert_eq!(stop_time(INT_MISSING).key(), None);
    }

    #[test]
    #[should_panic(expected = "compound key")]
    fn has_no_simple_id() {
        let _ = stop_time(1).id();
    }
}
