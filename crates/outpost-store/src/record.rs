use crate::layout::StoreLayout;
use crate::{write_atomic, StoreError};
use outpost_schema::Config;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct StoredConfig {
    config: Config,
    /// blake3 over the pretty-printed `config`.
    checksum: String,
}

fn compute_checksum(config: &Config) -> Result<String, StoreError> {
    let json = serde_json::to_string_pretty(config)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}

/// File-backed configuration record.
///
/// The record only exists once [`create`](Self::create) has run; until then
/// both `load` and `save` report [`StoreError::NotInstalled`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    layout: StoreLayout,
}

impl ConfigFile {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    pub fn exists(&self) -> bool {
        self.layout.is_initialized()
    }

    pub fn create(&self) -> Result<(), StoreError> {
        debug!("creating config storage at {}", self.layout.store_dir().display());
        self.layout.initialize()
    }

    pub fn load(&self) -> Result<Config, StoreError> {
        let path = self.layout.config_file();
        if !self.exists() || !path.exists() {
            return Err(StoreError::NotInstalled(path.display().to_string()));
        }
        self.layout.verify_version()?;

        let content = fs::read_to_string(&path)?;
        let stored: StoredConfig = serde_json::from_str(&content)?;

        let actual = compute_checksum(&stored.config)?;
        if actual != stored.checksum {
            return Err(StoreError::IntegrityFailure {
                path: path.display().to_string(),
                expected: stored.checksum,
                actual,
            });
        }

        Ok(stored.config)
    }

    pub fn save(&self, config: &Config) -> Result<(), StoreError> {
        if !self.exists() {
            return Err(StoreError::NotInstalled(
                self.layout.store_dir().display().to_string(),
            ));
        }

        let stored = StoredConfig {
            config: config.clone(),
            checksum: compute_checksum(config)?,
        };
        let content = serde_json::to_string_pretty(&stored)?;
        debug!("saving configuration record ({} bytes)", content.len());
        write_atomic(
            &self.layout.store_dir(),
            &self.layout.config_file(),
            content.as_bytes(),
        )
    }

    /// Delete the storage directory. Removing absent storage is a no-op.
    pub fn remove(&self) -> Result<(), StoreError> {
        let dir = self.layout.store_dir();
        if dir.exists() {
            debug!("removing config storage at {}", dir.display());
            fs::remove_dir_all(&dir)?;
        }
        Ok(())
    }
}
