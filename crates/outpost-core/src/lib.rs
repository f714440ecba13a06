//! Orchestration core for Outpost environment lifecycle.
//!
//! This crate keeps two independently failing systems in step: a remote
//! provisioning backend and the local configuration record that mirrors it.
//! `actions` holds the single-resource primitives that pair every remote
//! mutation with a save of the record (even when the remote call fails), and
//! `Engine` exposes the user-level workflows built on them: init, remove,
//! open/close port, edit, and uninstall. `lifecycle` guards status
//! transitions and `concurrency` provides the single-writer store lock.

pub mod actions;
pub mod concurrency;
pub mod edit;
pub mod engine;
pub mod init;
pub mod lifecycle;
pub mod ports;
pub mod remove;
pub mod uninstall;

pub use concurrency::{install_signal_handler, shutdown_requested, StoreLock};
pub use edit::{EditContent, EditInput};
pub use engine::{Engine, Output, OutputHandler};
pub use init::{InitHandle, InitInput};
pub use lifecycle::{
    ensure_env_initializable, ensure_env_ready, validate_cluster_transition,
    validate_env_transition,
};
pub use ports::{ClosePortContent, ClosePortInput, OpenPortContent, OpenPortInput, SSH_PORT};
pub use remove::{
    AlwaysConfirm, BoxError, NoopHook, PreRemoveHook, RemoveConfirmation, RemoveContent,
    RemoveInput,
};
pub use uninstall::{UninstallContent, UninstallInput};

use outpost_runtime::BackendError;
use outpost_schema::{ClusterStatus, EnvStatus, SchemaError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("outpost is not installed")]
    NotInstalled,
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error("cannot {action} environment '{env_name}' while it is {status}")]
    InvalidTransition {
        action: &'static str,
        env_name: String,
        status: EnvStatus,
    },
    #[error("invalid environment transition for '{env_name}': {from} -> {to}")]
    EnvTransition {
        env_name: String,
        from: EnvStatus,
        to: EnvStatus,
    },
    #[error("invalid cluster transition for '{cluster}': {from} -> {to}")]
    ClusterTransition {
        cluster: String,
        from: ClusterStatus,
        to: ClusterStatus,
    },
    #[error("cluster '{cluster}' still has {count} environment(s); remove them before uninstalling")]
    ExistingEnvs { cluster: String, count: usize },
    #[error("backend error: {0}")]
    Backend(BackendError),
    #[error("failed to save configuration: {0}")]
    Persistence(BackendError),
    #[error("pre-remove hook failed: {0}")]
    Hook(#[source] BoxError),
    #[error("removal confirmation failed: {0}")]
    Confirmation(#[source] BoxError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for CoreError {
    fn from(e: BackendError) -> Self {
        match e {
            BackendError::NotInstalled => Self::NotInstalled,
            other => Self::Backend(other),
        }
    }
}
