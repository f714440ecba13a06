use outpost_core::SSH_PORT;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND: &str = "local";
pub const DEFAULT_INSTANCE_TYPE: &str = "small";

/// User settings read from `~/.config/outpost/settings.toml`.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Owner used for bare `name` repository references.
    pub default_owner: Option<String>,
    pub instance_type: Option<String>,
    pub backend: Option<String>,
    /// Ports that open-port / close-port refuse. Defaults to the SSH port.
    pub reserved_ports: Option<Vec<String>>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("settings error: failed to read {}: {e}", path.display()))?;
        Self::parse(&content)
            .map_err(|e| format!("settings error: invalid {}: {e}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn instance_type(&self) -> &str {
        self.instance_type.as_deref().unwrap_or(DEFAULT_INSTANCE_TYPE)
    }

    pub fn backend(&self) -> &str {
        self.backend.as_deref().unwrap_or(DEFAULT_BACKEND)
    }

    pub fn reserved_ports(&self) -> Vec<String> {
        self.reserved_ports
            .clone()
            .unwrap_or_else(|| vec![SSH_PORT.to_owned()])
    }
}

/// `$OUTPOST_SETTINGS` if set, otherwise `~/.config/outpost/settings.toml`.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("OUTPOST_SETTINGS") {
        return Some(PathBuf::from(path));
    }
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/outpost/settings.toml"))
}
