//! Durable storage for the Outpost configuration record.
//!
//! This crate provides `StoreLayout` for the on-disk directory structure and
//! `ConfigFile`, which loads and atomically persists the `Config` record with
//! a blake3 checksum so a torn or hand-edited file is detected on load.

pub mod layout;
pub mod record;

pub use layout::{StoreLayout, STORE_FORMAT_VERSION};
pub use record::ConfigFile;

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Replace `dest` with `content` via a synced temp file in `dir` and a rename.
///
/// The directory is synced afterwards, since a rename is not durable until
/// its parent directory is.
pub(crate) fn write_atomic(dir: &Path, dest: &Path, content: &[u8]) -> Result<(), StoreError> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| StoreError::Io(e.error))?;
    std::fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration storage does not exist at {0}")]
    NotInstalled(String),
    #[error("integrity check failed for '{path}': expected {expected}, got {actual}")]
    IntegrityFailure {
        path: String,
        expected: String,
        actual: String,
    },
    #[error("store format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
