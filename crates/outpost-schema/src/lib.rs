//! Resource model for Outpost clusters and environments.
//!
//! This crate defines the entities mirrored in the local configuration record
//! (`Config`, `Cluster`, `Env`), their status enumerations, and the pure
//! helpers the orchestration layer relies on: environment name derivation,
//! SSH host-key parsing, port validation, and repository reference resolution.

pub mod cluster;
pub mod config;
pub mod env;
pub mod ports;
pub mod repository;
pub mod types;

pub use cluster::{Cluster, ClusterStatus, DEFAULT_CLUSTER_NAME};
pub use config::{Config, CONFIG_FORMAT_VERSION};
pub use env::{
    build_env_name_from_repository, build_env_name_slug, parse_ssh_host_keys, Env, EnvStatus,
    SshHostKey, ENV_ROOT_USER,
};
pub use ports::check_port_validity;
pub use repository::{
    build_git_http_url, build_git_url, parse_repository_name, ParsedRepositoryName,
    ResolvedRepository, REPOSITORY_HOST,
};
pub use types::{EnvId, GitUrl};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cluster '{0}' does not exist")]
    ClusterNotFound(String),
    #[error("environment '{env_name}' does not exist in cluster '{cluster_name}'")]
    EnvNotFound {
        cluster_name: String,
        env_name: String,
    },
    #[error("invalid port '{0}': expected an integer between 1 and 65535")]
    InvalidPort(String),
    #[error("port '{0}' is reserved")]
    ReservedPort(String),
    #[error("invalid host key (\"{0}\")")]
    InvalidHostKey(String),
    #[error("invalid repository reference '{0}'")]
    InvalidRepository(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
