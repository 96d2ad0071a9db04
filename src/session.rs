// src/session.rs

use anyhow::Result;
use std::{
    io::{Read, Seek, Write},
    sync::Arc,
};
use zip::{ZipArchive, ZipWriter};

use crate::{
    config::SessionConfig,
    dedup::Deduplicator,
    diagnostics::{Diagnostic, ErrorSink},
    load::{ProgressListener, TableLoader},
    refs::ReferenceIndex,
    table::{Table, TableSpec},
    write::TableWriter,
};

/// State shared by every table loaded or written while processing one feed.
///
/// Hand out `&FeedSession` to loaders and writers; it is `Sync`, so tables can be
/// processed on separate threads against the same session.
pub struct FeedSession {
    config: SessionConfig,
    dedup: Deduplicator,
    errors: ErrorSink,
    refs: ReferenceIndex,
    progress: Option<Arc<dyn ProgressListener>>,
}

impl FeedSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            dedup: Deduplicator::new(),
            errors: ErrorSink::new(),
            refs: ReferenceIndex::new(),
            progress: None,
        }
    }

    pub fn with_progress(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    pub fn errors(&self) -> &ErrorSink {
        &self.errors
    }

    pub fn refs(&self) -> &ReferenceIndex {
        &self.refs
    }

    pub fn progress(&self) -> Option<&dyn ProgressListener> {
        self.progress.as_deref()
    }

    /// Load one table from `archive`. Only I/O faults on the archive are errors.
    pub fn load<S, R>(&self, archive: &mut ZipArchive<R>, spec: &S) -> Result<Table<S::Entity>>
    where
        S: TableSpec,
        R: Read + Seek,
    {
        TableLoader::new(self, S::NAME, S::REQUIRED).load(archive, spec)
    }

    /// Load one table into `table`. On an I/O fault the rows read so far stay in `table`.
    pub fn load_into<S, R>(
        &self,
        archive: &mut ZipArchive<R>,
        spec: &S,
        table: &mut Table<S::Entity>,
    ) -> Result<()>
    where
        S: TableSpec,
        R: Read + Seek,
    {
        TableLoader::new(self, S::NAME, S::REQUIRED).load_into(archive, spec, table)
    }

    /// Write `entities` as `<NAME>.txt` into `zip`. Returns the number of rows written.
    pub fn write<'e, S, W, I>(&self, spec: &S, entities: I, zip: &mut ZipWriter<W>) -> Result<u64>
    where
        S: TableSpec,
        S::Entity: 'e,
        W: Write + Seek,
        I: IntoIterator<Item = &'e S::Entity>,
    {
        TableWriter::new(self, S::NAME).write(spec, entities, zip)
    }

    /// Ends the session, yielding every diagnostic in the order it was recorded.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.errors.into_vec()
    }
}

impl Default for FeedSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
