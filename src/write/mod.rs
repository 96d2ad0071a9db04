// src/write/mod.rs

mod row;

use anyhow::{Context, Result};
use std::io::{Seek, Write};
use tracing::{info, instrument};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::{session::FeedSession, table::TableSpec, util::human};

pub use row::RowWriter;

/// Serializes a collection of entities into a `<table>.txt` entry of an output archive.
pub struct TableWriter<'s> {
    session: &'s FeedSession,
    table: &'static str,
    row: u64,
}

impl<'s> TableWriter<'s> {
    pub fn new(session: &'s FeedSession, table: &'static str) -> Self {
        Self {
            session,
            table,
            row: 0,
        }
    }

    /// Writes the header then every entity in iteration order. The entry is flushed
    /// here and closed when the archive starts its next entry or finishes.
    #[instrument(level = "info", skip_all, fields(table = self.table))]
    pub fn write<'e, S, W, I>(mut self, spec: &S, entities: I, zip: &mut ZipWriter<W>) -> Result<u64>
    where
        S: TableSpec,
        S::Entity: 'e,
        W: Write + Seek,
        I: IntoIterator<Item = &'e S::Entity>,
    {
        info!("writing table {}", self.table);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(format!("{}.txt", self.table), options)
            .with_context(|| format!("starting archive entry for {}", self.table))?;

        {
            let mut out = RowWriter::new(&mut *zip);
            out.write_header(S::COLUMNS)?;
            for entity in entities {
                self.row += 1;
                if self.session.config().is_milestone(self.row) {
                    info!("record number {}", human(self.row));
                }
                spec.encode(entity, &mut out)
                    .with_context(|| format!("writing {} row {}", self.table, self.row))?;
                out.end_record()?;
            }
            out.flush()
                .with_context(|| format!("flushing {}", self.table))?;
        }
        zip.flush()?;

        info!("wrote {} rows", human(self.row));
        Ok(self.row)
    }
}
