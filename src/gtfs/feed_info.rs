use anyhow::Result;
use chrono::NaiveDate;
use std::{io::Write, sync::Arc};

use crate::{
    codec::FeedUrl,
    load::RowReader,
    table::{Entity, TableSpec},
    write::RowWriter,
};

/// Publisher metadata. Normally a single row.
#[derive(Debug, Clone)]
pub struct FeedInfo {
    pub source_row: u64,
    pub feed_publisher_name: Option<Arc<str>>,
    pub feed_publisher_url: Option<FeedUrl>,
    pub feed_lang: Option<Arc<str>>,
    pub feed_start_date: Option<NaiveDate>,
    pub feed_end_date: Option<NaiveDate>,
    pub feed_version: Option<Arc<str>>,
    pub feed_contact_email: Option<Arc<str>>,
    pub feed_contact_url: Option<FeedUrl>,
}

impl Entity for FeedInfo {
    type Key = Arc<str>;

    fn source_row(&self) -> u64 {
        self.source_row
    }

    fn key(&self) -> Option<Arc<str>> {
        self.feed_publisher_name.clone()
    }

    fn id(&self) -> Option<&str> {
        self.feed_publisher_name.as_deref()
    }
}

pub struct FeedInfoTable;

impl TableSpec for FeedInfoTable {
    type Entity = FeedInfo;

    const NAME: &'static str = "feed_info";
    const REQUIRED: bool = false;
    const KEY_FIELD: &'static str = "feed_publisher_name";
    const COLUMNS: &'static [&'static str] = &[
        "feed_publisher_name",
        "feed_publisher_url",
        "feed_lang",
        "feed_start_date",
        "feed_end_date",
        "feed_version",
        "feed_contact_email",
        "feed_contact_url",
    ];

    fn decode(&self, row: &mut RowReader<'_>) -> FeedInfo {
        FeedInfo {
            source_row: row.row(),
            feed_publisher_name: row.string_field("feed_publisher_name", true),
            feed_publisher_url: row.url_field("feed_publisher_url", true),
            feed_lang: row.string_field("feed_lang", true),
            feed_start_date: row.date_field("feed_start_date", false),
            feed_end_date: row.date_field("feed_end_date", false),
            feed_version: row.string_field("feed_version", false),
            feed_contact_email: row.string_field("feed_contact_email", false),
            feed_contact_url: row.url_field("feed_contact_url", false),
        }
    }

    fn encode<W: Write>(&self, fi: &FeedInfo, row: &mut RowWriter<'_, W>) -> Result<()> {
        row.write_string(fi.feed_publisher_name.as_deref())?;
        row.write_url(fi.feed_publisher_url.as_ref())?;
        row.write_string(fi.feed_lang.as_deref())?;
        row.write_date(fi.feed_start_date)?;
        row.write_date(fi.feed_end_date)?;
        row.write_string(fi.feed_version.as_deref())?;
        row.write_string(fi.feed_contact_email.as_deref())?;
        row.write_url(fi.feed_contact_url.as_ref())
    }
}
