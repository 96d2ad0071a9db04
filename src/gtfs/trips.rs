use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    load::RowReader,
    table::{Entity, Table, TableSpec},
    write::RowWriter,
};

use super::routes::Route;

#[derive(Debug, Clone)]
pub struct Trip {
    pub source_row: u64,
    pub route_id: Option<Arc<str>>,
    pub service_id: Option<Arc<str>>,
    pub trip_id: Option<Arc<str>>,
    pub trip_headsign: Option<Arc<str>>,
    pub trip_short_name: Option<Arc<str>>,
    pub direction_id: i32,
    pub block_id: Option<Arc<str>>,
    pub shape_id: Option<Arc<str>>,
    pub wheelchair_accessible: i32,
    pub bikes_allowed: i32,
}

impl Entity for Trip {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<Arc<str>> {
        self.trip_id.clone()
    }

    fn id(&self) -> Option<&str> {
        self.trip_id.as_deref()
    }
}

pub struct TripTable<'a> {
    pub routes: &'a Table<Route>,
}

impl TableSpec for TripTable<'_> {
    type Entity = Trip;

    const NAME: &'static str = "trips";
    const REQUIRED: bool = true;
    const KEY_FIELD: &'static str = "trip_id";
    const COLUMNS: &'static [&'static str] = &[
        "route_id",
        "service_id",
        "trip_id",
        "trip_headsign",
        "trip_short_name",
        "direction_id",
        "block_id",
        "shape_id",
        "wheelchair_accessible",
        "bikes_allowed",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> Trip {
        Trip {
            source_row: row.row(),
            route_id: row.ref_field("route_id", true, self.routes).key,
            // may live in calendar or calendar_dates, so it is not resolved here
            service_id: row.string_field("service_id", true),
            trip_id: row.string_field("trip_id", true),
            trip_headsign: row.string_field("trip_headsign", false),
            trip_short_name: row.string_field("trip_short_name", false),
            direction_id: row.int_field("direction_id", false, 0..=1),
            block_id: row.string_field("block_id", false),
            shape_id: row.string_field("shape_id", false),
            wheelchair_accessible: row.int_field("wheelchair_accessible", false, 0..=2),
            bikes_allowed: row.int_field("bikes_allowed", false, 0..=2),
        }
    }

    fn encode<W: Write>(&self, t: &Trip, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(t.route_id.as_deref())?;
        row.write_string(t.service_id.as_deref())?;
        row.write_string(t.trip_id.as_deref())?;
        row.write_string(t.trip_headsign.as_deref())?;
        row.write_string(t.trip_short_name.as_deref())?;
        row.write_int(t.direction_id)?;
        row.write_string(t.block_id.as_deref())?;
        row.write_string(t.shape_id.as_deref())?;
        row.write_int(t.wheelchair_accessible)?;
        row.write_int(t.bikes_allowed)
    }
}
