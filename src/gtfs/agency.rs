use anyhow::Result;
use std::{io::Write, sync::Arc};

use crate::{
    codec::FeedUrl,
    load::RowReader,
    table::{Entity, TableSpec},
    write::RowWriter,
};

#[derive(Debug, Clone)]
pub struct Agency {
    pub source_row: u64,
    pub agency_id: Option<Arc<str>>,
    pub agency_name: Option<Arc<str>>,
    pub agency_url: Option<FeedUrl>,
    pub agency_timezone: Option<Arc<str>>,
    pub agency_lang: Option<Arc<str>>,
    pub agency_phone: Option<Arc<str>>,
    pub agency_fare_url: Option<FeedUrl>,
    pub agency_email: Option<Arc<str>>,
}

impl Entity for Agency {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    /// Single-agency feeds may omit `agency_id`; such an agency is stored under the empty id.
    fn key(&self) -> Option<Arc<str>> {
        Some(self.agency_id.clone().unwrap_or_else(|| Arc::from("")))
    }

    fn id(&self) -> Option<&str> {
        self.agency_id.as_deref()
    }
}

pub struct AgencyTable;

impl TableSpec for AgencyTable {
    type Entity = Agency;

    const NAME: &'static str = "agency";
    const REQUIRED: bool = true;
    const KEY_FIELD: &'static str = "agency_id";
    const COLUMNS: &'static [&'static str] = &[
        "agency_id",
        "agency_name",
        "agency_url",
        "agency_timezone",
        "agency_lang",
        "agency_phone",
        "agency_fare_url",
        "agency_email",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> Agency {
        Agency {
            source_row: row.row(),
            agency_id: row.string_field("agency_id", false),
            agency_name: row.string_field("agency_name", true),
            agency_url: row.url_field("agency_url", true),
            agency_timezone: row.string_field("agency_timezone", true),
            agency_lang: row.string_field("agency_lang", false),
            agency_phone: row.string_field("agency_phone", false),
            agency_fare_url: row.url_field("agency_fare_url", false),
            agency_email: row.string_field("agency_email", false),
        }
    }

    fn encode<W: Write>(&self, a: &Agency, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(a.agency_id.as_deref())?;
        row.write_string(a.agency_name.as_deref())?;
        row.write_url(a.agency_url.as_ref())?;
        row.write_string(a.agency_timezone.as_deref())?;
        row.write_string(a.agency_lang.as_deref())?;
        row.write_string(a.agency_phone.as_deref())?;
        row.write_url(a.agency_fare_url.as_ref())?;
        row.write_string(a.agency_email.as_deref())
    }
}
