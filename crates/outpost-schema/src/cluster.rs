use crate::env::Env;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the cluster workflows drive when the caller does not pick one.
pub const DEFAULT_CLUSTER_NAME: &str = "default";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClusterStatus {
    Creating,
    Created,
    Removing,
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterStatus::Creating => write!(f, "creating"),
            ClusterStatus::Created => write!(f, "created"),
            ClusterStatus::Removing => write!(f, "removing"),
        }
    }
}

/// Shared infrastructure hosting zero or more environments.
///
/// Environments are keyed by name. They are written through
/// [`Config::set_env`](crate::Config::set_env) rather than through a cluster
/// copy, so a stale cluster value can never clobber them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cluster {
    pub name: String,
    pub instance_type: String,
    pub is_default: bool,
    #[serde(default)]
    pub infrastructure_json: String,
    pub status: ClusterStatus,
    pub created_at_timestamp: i64,
    #[serde(default)]
    pub envs: BTreeMap<String, Env>,
}

impl Cluster {
    pub fn new(name: impl Into<String>, instance_type: impl Into<String>, is_default: bool) -> Self {
        Self {
            name: name.into(),
            instance_type: instance_type.into(),
            is_default,
            infrastructure_json: String::new(),
            status: ClusterStatus::Creating,
            created_at_timestamp: chrono::Utc::now().timestamp(),
            envs: BTreeMap::new(),
        }
    }

    pub fn set_infrastructure_json(
        &mut self,
        infrastructure: &impl Serialize,
    ) -> Result<(), SchemaError> {
        self.infrastructure_json = serde_json::to_string(infrastructure)?;
        Ok(())
    }
}
