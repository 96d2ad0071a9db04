// src/testutil.rs

use anyhow::Result;
use std::io::{Cursor, Read, Write};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zip::{write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

pub(crate) fn init_test_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// In-memory archive from `(name, content)` pairs. Names ending in `/` become directories.
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
    let raw: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(name, content)| (*name, content.as_bytes()))
        .collect();
    zip_raw(&raw)
}

/// Like [`zip_bytes`] for content that need not be UTF-8. Entries are stored uncompressed.
pub(crate) fn zip_raw(entries: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(*name, options)?;
        } else {
            zip.start_file(*name, options)?;
            zip.write_all(content)?;
        }
    }
    Ok(zip.finish()?.into_inner())
}

/// Changes the stored byte right after the last occurrence of `marker`, so the
/// entry holding it fails its checksum once read to the end.
pub(crate) fn corrupt_after(bytes: &mut [u8], marker: &str) {
    let marker = marker.as_bytes();
    let at = bytes
        .windows(marker.len())
        .rposition(|window| window == marker)
        .expect("marker in archive")
        + marker.len();
    bytes[at] = if bytes[at] == b'1' { b'2' } else { b'1' };
}

pub(crate) fn archive(bytes: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    Ok(ZipArchive::new(Cursor::new(bytes))?)
}

pub(crate) fn entry_text(bytes: &[u8], name: &str) -> Result<String> {
    let mut archive = archive(bytes)?;
    let mut entry = archive.by_name(name)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}
