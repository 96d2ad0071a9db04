use serde::Serialize;
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use super::{Diagnostic, DiagnosticKind};

/// Append-only, ordered collection of diagnostics shared by every table of a session.
///
/// Appending never fails and never interrupts the caller. Safe to share between
/// threads loading different tables.
#[derive(Debug, Default)]
pub struct ErrorSink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl ErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of everything recorded so far, in append order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of diagnostics matching `pred`.
    pub fn count_where(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.lock().iter().filter(|d| pred(d)).count()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<&'static str, usize> {
        tally(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Diagnostic>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn tally(diagnostics: &[Diagnostic]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for d in diagnostics {
        *counts.entry(d.kind.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Import report handed to whoever decides whether a feed is acceptable.
#[derive(Debug, Serialize)]
pub struct DiagnosticReport {
    pub feed: String,
    pub tables: BTreeMap<&'static str, usize>,
    pub counts_by_kind: BTreeMap<&'static str, usize>,
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    pub fn new(
        feed: impl Into<String>,
        tables: BTreeMap<&'static str, usize>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            feed: feed.into(),
            tables,
            counts_by_kind: tally(&diagnostics),
            diagnostics,
        }
    }

    /// True if any required table was missing entirely.
    pub fn has_missing_tables(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::MissingTable)
    }
}
