//! Structured, non-fatal problems found while loading or writing tables.

mod sink;

use serde::Serialize;
use std::fmt;

use crate::codec::FieldProblem;

pub use sink::{DiagnosticReport, ErrorSink};

/// How far a problem reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Table-scoped; ends the row scan of that one table.
    Structural,
    /// One cell; the field falls back to its missing sentinel.
    Field,
    /// One row; the record may be dropped or overwritten.
    RowIntegrity,
}

/// What went wrong. Each variant carries only the detail it needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    MissingTable,
    TableInSubdirectory { prefix: String },
    EmptyTable,
    MissingColumn,
    EmptyField,
    NumberParse,
    TimeParse,
    DateParse,
    UrlParse,
    Range { min: f64, max: f64, actual: f64 },
    MissingKey,
    DuplicateKey { key: String },
    ReferentialIntegrity { key: String },
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MissingTable => "MissingTableError",
            DiagnosticKind::TableInSubdirectory { .. } => "TableInSubdirectoryError",
            DiagnosticKind::EmptyTable => "EmptyTableError",
            DiagnosticKind::MissingColumn => "MissingColumnError",
            DiagnosticKind::EmptyField => "EmptyFieldError",
            DiagnosticKind::NumberParse => "NumberParseError",
            DiagnosticKind::TimeParse => "TimeParseError",
            DiagnosticKind::DateParse => "DateParseError",
            DiagnosticKind::UrlParse => "URLParseError",
            DiagnosticKind::Range { .. } => "RangeError",
            DiagnosticKind::MissingKey => "MissingKeyError",
            DiagnosticKind::DuplicateKey { .. } => "DuplicateKeyError",
            DiagnosticKind::ReferentialIntegrity { .. } => "ReferentialIntegrityError",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            DiagnosticKind::MissingTable
            | DiagnosticKind::TableInSubdirectory { .. }
            | DiagnosticKind::EmptyTable => Tier::Structural,
            DiagnosticKind::MissingColumn
            | DiagnosticKind::EmptyField
            | DiagnosticKind::NumberParse
            | DiagnosticKind::TimeParse
            | DiagnosticKind::DateParse
            | DiagnosticKind::UrlParse
            | DiagnosticKind::Range { .. } => Tier::Field,
            DiagnosticKind::MissingKey
            | DiagnosticKind::DuplicateKey { .. }
            | DiagnosticKind::ReferentialIntegrity { .. } => Tier::RowIntegrity,
        }
    }
}

impl From<FieldProblem> for DiagnosticKind {
    fn from(problem: FieldProblem) -> Self {
        match problem {
            FieldProblem::NumberParse => DiagnosticKind::NumberParse,
            FieldProblem::TimeParse => DiagnosticKind::TimeParse,
            FieldProblem::DateParse => DiagnosticKind::DateParse,
            FieldProblem::UrlParse => DiagnosticKind::UrlParse,
            FieldProblem::Range { min, max, actual } => DiagnosticKind::Range { min, max, actual },
        }
    }
}

/// One problem, located by table, 1-based data row (0 = the table itself) and column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub table: String,
    pub row: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn table_level(table: &str, kind: DiagnosticKind) -> Self {
        Self {
            table: table.to_owned(),
            row: 0,
            column: None,
            kind,
        }
    }

    pub fn at(table: &str, row: u64, column: &str, kind: DiagnosticKind) -> Self {
        Self {
            table: table.to_owned(),
            row,
            column: Some(column.to_owned()),
            kind,
        }
    }

    pub fn tier(&self) -> Tier {
        self.kind.tier()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.kind.as_str(), self.table)?;
        if self.row > 0 {
            write!(f, " row {}", self.row)?;
        }
        if let Some(column) = &self.column {
            write!(f, " column {}", column)?;
        }
        match &self.kind {
            DiagnosticKind::TableInSubdirectory { prefix } => write!(f, ": found under {prefix:?}"),
            DiagnosticKind::Range { min, max, actual } => {
                write!(f, ": {actual} outside [{min}, {max}]")
            }
            DiagnosticKind::DuplicateKey { key } => write!(f, ": key {key:?} already present"),
            DiagnosticKind::ReferentialIntegrity { key } => write!(f, ": {key:?} not found"),
            _ => Ok(()),
        }
    }
}
