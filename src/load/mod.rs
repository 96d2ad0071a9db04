// src/load/mod.rs

mod progress;
mod row;

use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};
use std::{
    collections::{HashMap, HashSet},
    io::{self, BufRead, BufReader, Read, Seek},
};
use tracing::{debug, info, instrument, warn};
use zip::ZipArchive;

use crate::{
    diagnostics::{Diagnostic, DiagnosticKind},
    session::FeedSession,
    table::{Entity, Table, TableSpec},
    util::human,
};

pub use progress::{LogProgress, ProgressListener, ProgressReader};
pub use row::{Reference, RowReader};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads one `<table>.txt` entry of an archive into a [`Table`].
///
/// Single pass, single use: the row counter and the set of already-reported
/// missing columns belong to this one table.
pub struct TableLoader<'s> {
    session: &'s FeedSession,
    table: &'static str,
    required: bool,
    row: u64,
    missing_columns: HashSet<String>,
}

impl<'s> TableLoader<'s> {
    pub fn new(session: &'s FeedSession, table: &'static str, required: bool) -> Self {
        Self {
            session,
            table,
            required,
            row: 0,
            missing_columns: HashSet::new(),
        }
    }

    /// Locate the table, scan every row through `spec`, and return what was kept.
    pub fn load<S, R>(self, archive: &mut ZipArchive<R>, spec: &S) -> Result<Table<S::Entity>>
    where
        S: TableSpec,
        R: Read + Seek,
    {
        let mut table = Table::new(self.table);
        self.load_into(archive, spec, &mut table)?;
        Ok(table)
    }

    /// Like [`Self::load`] but fills a table owned by the caller.
    ///
    /// Data problems go to the session's error sink. Only I/O faults on the archive
    /// are returned as errors, and `table` then holds every row read before the fault.
    #[instrument(level = "info", skip_all, fields(table = self.table))]
    pub fn load_into<S, R>(
        mut self,
        archive: &mut ZipArchive<R>,
        spec: &S,
        table: &mut Table<S::Entity>,
    ) -> Result<()>
    where
        S: TableSpec,
        R: Read + Seek,
    {
        let Some(index) = self.locate(archive) else {
            if self.required {
                self.report_table(DiagnosticKind::MissingTable);
            } else {
                info!("table {} was missing but it is not required", self.table);
            }
            return Ok(());
        };

        let entry = archive
            .by_index(index)
            .with_context(|| format!("opening archive entry for table {}", self.table))?;
        let entry_name = entry.name().to_owned();
        let size = entry.size();
        info!(entry = %entry_name, bytes = size, "loading table {}", self.table);

        let session = self.session;
        let scanned = match session.progress() {
            Some(listener) => {
                listener.begin_task(&format!("Loading table {}", entry_name), size);
                self.scan(ProgressReader::new(entry, listener), spec, table)
            }
            None => self.scan(entry, spec, table),
        };
        if scanned.is_err() {
            warn!(
                "{} failed after {} rows, keeping {} records",
                entry_name,
                human(self.row),
                human(table.len() as u64)
            );
        }
        scanned.with_context(|| format!("reading {}", entry_name))
    }

    /// Index of `<table>.txt`, falling back to the first entry named `.../<table>.txt`.
    fn locate<R: Read + Seek>(&self, archive: &ZipArchive<R>) -> Option<usize> {
        let file_name = format!("{}.txt", self.table);
        if let Some(index) = archive.index_for_name(&file_name) {
            return Some(index);
        }

        let nested_suffix = format!("/{}", file_name);
        let nested = archive
            .file_names()
            .find(|name| name.ends_with(&nested_suffix))?
            .to_owned();
        let prefix = nested[..nested.len() - file_name.len()].to_owned();
        warn!(prefix = %prefix, "table {} found in a subdirectory", self.table);
        self.report_table(DiagnosticKind::TableInSubdirectory { prefix });
        archive.index_for_name(&nested)
    }

    fn scan<S, R>(&mut self, input: R, spec: &S, table: &mut Table<S::Entity>) -> Result<()>
    where
        S: TableSpec,
        R: Read,
    {
        let input = skip_bom(input).context("reading start of entry")?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(input);

        let mut record = ByteRecord::new();
        let has_header = reader
            .read_byte_record(&mut record)
            .context("reading header")?;
        if !has_header || is_blank(&record) {
            self.report_table(DiagnosticKind::EmptyTable);
            return Ok(());
        }
        let headers = header_index(&record);
        debug!(columns = headers.len(), "parsed header");

        while reader
            .read_byte_record(&mut record)
            .with_context(|| format!("reading row {}", self.row + 1))?
        {
            self.row += 1;
            if self.session.config().is_milestone(self.row) {
                info!("record number {}", human(self.row));
            }
            let entity = {
                let mut fields = RowReader::new(
                    self.session,
                    self.table,
                    self.row,
                    &headers,
                    &record,
                    &mut self.missing_columns,
                );
                spec.decode(&mut fields)
            };
            self.insert_checking_duplicate_key(table, entity, S::KEY_FIELD);
        }

        if self.row == 0 {
            self.report_table(DiagnosticKind::EmptyTable);
        }
        info!(
            "read {} rows from {}, kept {}",
            human(self.row),
            self.table,
            human(table.len() as u64)
        );
        Ok(())
    }

    /// Keyless records are dropped. A repeated key overwrites the earlier record
    /// and is reported once per overwrite.
    fn insert_checking_duplicate_key<E: Entity>(
        &self,
        table: &mut Table<E>,
        entity: E,
        key_field: &str,
    ) {
        let Some(key) = entity.key() else {
            self.report_row(key_field, DiagnosticKind::MissingKey);
            return;
        };
        let duplicate = table.contains_key(&key).then(|| key.to_string());
        table.insert(key, entity);
        if let Some(key) = duplicate {
            self.report_row(key_field, DiagnosticKind::DuplicateKey { key });
        }
    }

    fn report_table(&self, kind: DiagnosticKind) {
        self.session
            .errors()
            .push(Diagnostic::table_level(self.table, kind));
    }

    fn report_row(&self, column: &str, kind: DiagnosticKind) {
        self.session
            .errors()
            .push(Diagnostic::at(self.table, self.row, column, kind));
    }
}

/// Files must be UTF-8, but a leading byte order mark is tolerated and dropped.
fn skip_bom<R: Read>(input: R) -> io::Result<BufReader<R>> {
    let mut buffered = BufReader::new(input);
    if buffered.fill_buf()?.starts_with(UTF8_BOM) {
        buffered.consume(UTF8_BOM.len());
    }
    Ok(buffered)
}

fn is_blank(record: &ByteRecord) -> bool {
    record.iter().all(<[u8]>::is_empty)
}

/// Column name → position. The first of any repeated names wins.
fn header_index(record: &ByteRecord) -> HashMap<String, usize> {
    let mut index = HashMap::with_capacity(record.len());
    for (position, name) in record.iter().enumerate() {
        index
            .entry(String::from_utf8_lossy(name).into_owned())
            .or_insert(position);
    }
    index
}
