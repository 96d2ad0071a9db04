use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::FeedUrl,
    load::RowReader,
    table::{Entity, TableSpec},
    write::RowWriter,
};

#[derive(Debug, Clone)]
pub struct Stop {
    pub source_row: u64,
    pub stop_id: Option<Arc<str>>,
    pub stop_code: Option<Arc<str>>,
    pub stop_name: Option<Arc<str>>,
    pub stop_desc: Option<Arc<str>>,
    pub stop_lat: f64,
    pub stop_lon: f64,
    pub zone_id: Option<Arc<str>>,
    pub stop_url: Option<FeedUrl>,
    pub location_type: i32,
    pub parent_station: Option<Arc<str>>,
    pub stop_timezone: Option<Arc<str>>,
    pub wheelchair_boarding: i32,
}

impl Entity for Stop {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<Arc<str>> {
        self.stop_id.clone()
    }

    fn id(&self) -> Option<&str> {
        self.stop_id.as_deref()
    }
}

pub struct StopTable;

impl TableSpec for StopTable {
    type Entity = Stop;

    const NAME: &'static str = "stops";
    const REQUIRED: bool = true;
    const KEY_FIELD: &'static str = "stop_id";
    const COLUMNS: &'static [&'static str] = &[
        "stop_id",
        "stop_code",
        "stop_name",
        "stop_desc",
        "stop_lat",
        "stop_lon",
        "zone_id",
        "stop_url",
        "location_type",
        "parent_station",
        "stop_timezone",
        "wheelchair_boarding",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> Stop {
        Stop {
            source_row: row.row(),
            stop_id: row.string_field("stop_id", true),
            stop_code: row.string_field("stop_code", false),
            stop_name: row.string_field("stop_name", true),
            stop_desc: row.string_field("stop_desc", false),
            stop_lat: row.double_field("stop_lat", true, -90.0..=90.0),
            stop_lon: row.double_field("stop_lon", true, -180.0..=180.0),
            zone_id: row.string_field("zone_id", false),
            stop_url: row.url_field("stop_url", false),
            // empty means a plain stop or platform
            location_type: row.int_field_or("location_type", false, 0..=4, 0),
            parent_station: row.string_field("parent_station", false),
            stop_timezone: row.string_field("stop_timezone", false),
            wheelchair_boarding: row.int_field("wheelchair_boarding", false, 0..=2),
        }
    }

    fn encode<W: Write>(&self, s: &Stop, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(s.stop_id.as_deref())?;
        row.write_string(s.stop_code.as_deref())?;
        row.write_string(s.stop_name.as_deref())?;
        row.write_string(s.stop_desc.as_deref())?;
        row.write_double(s.stop_lat)?;
        row.write_double(s.stop_lon)?;
        row.write_string(s.zone_id.as_deref())?;
        row.write_url(s.stop_url.as_ref())?;
        row.write_int(s.location_type)?;
        row.write_string(s.parent_station.as_deref())?;
        row.write_string(s.stop_timezone.as_deref())?;
        row.write_int(s.wheelchair_boarding)
    }
}
