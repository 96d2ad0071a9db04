//! Load, validate and rewrite GTFS transit feeds packaged as zip archives.
//!
//! A [`session::FeedSession`] carries the state shared by every table of one
//! feed: the string pool, the error sink and the index of foreign keys already
//! checked. [`gtfs::Feed`] loads the whole feed through it, and the building
//! blocks ([`load::TableLoader`], [`write::TableWriter`], [`table::TableSpec`])
//! can be used directly for other table sets.

pub mod codec;
pub mod config;
pub mod dedup;
pub mod diagnostics;
pub mod gtfs;
pub mod load;
pub mod refs;
pub mod session;
pub mod table;
pub mod util;
pub mod write;

#[cfg(test)]
mod testutil;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticReport};
pub use gtfs::Feed;
pub use session::FeedSession;
