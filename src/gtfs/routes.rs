use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::FeedUrl,
    load::RowReader,
    table::{Entity, Table, TableSpec},
    write::RowWriter,
};

use super::agency::Agency;

#[derive(Debug, Clone)]
pub struct Route {
    pub source_row: u64,
    pub route_id: Option<Arc<str>>,
    pub agency_id: Option<Arc<str>>,
    pub route_short_name: Option<Arc<str>>,
    pub route_long_name: Option<Arc<str>>,
    pub route_desc: Option<Arc<str>>,
    pub route_type: i32,
    pub route_url: Option<FeedUrl>,
    pub route_color: Option<Arc<str>>,
    pub route_text_color: Option<Arc<str>>,
    pub route_sort_order: i32,
}

impl Entity for Route {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<Arc<str>> {
        self.route_id.clone()
    }

    fn id(&self) -> Option<&str> {
        self.route_id.as_deref()
    }
}

/// Routes point at their operating agency.
pub struct RouteTable<'a> {
    pub agencies: &'a Table<Agency>,
}

impl TableSpec for RouteTable<'_> {
    type Entity = Route;

    const NAME: &'static str = "routes";
    const REQUIRED: bool = true;
    const KEY_FIELD: &'static str = "route_id";
    const COLUMNS: &'static [&'static str] = &[
        "route_id",
        "agency_id",
        "route_short_name",
        "route_long_name",
        "route_desc",
        "route_type",
        "route_url",
        "route_color",
        "route_text_color",
        "route_sort_order",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> Route {
        Route {
            source_row: row.row(),
            route_id: row.string_field("route_id", true),
            agency_id: row.ref_field("agency_id", false, self.agencies).key,
            route_short_name: row.string_field("route_short_name", false),
            route_long_name: row.string_field("route_long_name", false),
            route_desc: row.string_field("route_desc", false),
            // basic types 0-12 plus the extended 100-1702 range
            route_type: row.int_field("route_type", true, 0..=1702),
            route_url: row.url_field("route_url", false),
            route_color: row.string_field("route_color", false),
            route_text_color: row.string_field("route_text_color", false),
            route_sort_order: row.int_field("route_sort_order", false, 0..=i32::MAX),
        }
    }

    fn encode<W: Write>(&self, r: &Route, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(r.route_id.as_deref())?;
        row.write_string(r.agency_id.as_deref())?;
        row.write_string(r.route_short_name.as_deref())?;
        row.write_string(r.route_long_name.as_deref())?;
        row.write_string(r.route_desc.as_deref())?;
        row.write_int(r.route_type)?;
        row.write_url(r.route_url.as_ref())?;
        row.write_string(r.route_color.as_deref())?;
        row.write_string(r.route_text_color.as_deref())?;
        row.write_int(r.route_sort_order)
    }
}
