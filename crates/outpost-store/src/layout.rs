use crate::{write_atomic, StoreError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Current store format version. Incremented on incompatible layout changes.
pub const STORE_FORMAT_VERSION: u32 = 1;
const VERSION_FILE: &str = "version";

/// Directory layout backing the configuration record.
///
/// ```text
/// <root>/
///   .lock           single-writer lock, outlives the store directory
///   store/
///     version       format marker, written on initialize
///     config.json   the record itself
/// ```
#[derive(Debug, Clone)]
pub struct StoreLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreVersion {
    format_version: u32,
}

impl StoreLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }

    #[inline]
    pub fn config_file(&self) -> PathBuf {
        self.store_dir().join("config.json")
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    fn version_file(&self) -> PathBuf {
        self.store_dir().join(VERSION_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.version_file().exists()
    }

    /// Create the store directory and its version marker. An existing store
    /// is only checked.
    pub fn initialize(&self) -> Result<(), StoreError> {
        let dir = self.store_dir();
        fs::create_dir_all(&dir)?;
        if self.is_initialized() {
            return self.verify_version();
        }

        let marker = serde_json::to_vec_pretty(&StoreVersion {
            format_version: STORE_FORMAT_VERSION,
        })?;
        write_atomic(&dir, &self.version_file(), &marker)
    }

    pub fn verify_version(&self) -> Result<(), StoreError> {
        let marker: StoreVersion = serde_json::from_slice(&fs::read(self.version_file())?)?;
        match marker.format_version {
            STORE_FORMAT_VERSION => Ok(()),
            found => Err(StoreError::VersionMismatch {
                expected: STORE_FORMAT_VERSION,
                found,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = StoreLayout::new("/tmp/outpost-test");
        assert_eq!(layout.store_dir(), PathBuf::from("/tmp/outpost-test/store"));
        assert_eq!(
            layout.config_file(),
            PathBuf::from("/tmp/outpost-test/store/config.json")
        );
        assert_eq!(
            layout.lock_file(),
            PathBuf::from("/tmp/outpost-test/.lock")
        );
    }

    #[test]
    fn initialize_writes_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        assert!(!layout.is_initialized());
        layout.initialize().unwrap();
        assert!(layout.is_initialized());
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn foreign_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let layout = StoreLayout::new(dir.path());
        fs::create_dir_all(layout.store_dir()).unwrap();
        fs::write(layout.version_file(), r#"{"format_version": 99}"#).unwrap();

        assert!(matches!(
            layout.initialize(),
            Err(StoreError::VersionMismatch { found: 99, .. })
        ));
    }
}
