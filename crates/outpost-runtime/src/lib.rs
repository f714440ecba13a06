//! Provisioning backends and progress reporting for Outpost.
//!
//! This crate defines the contracts the orchestration layer consumes: the
//! `CloudService` provisioning backend (record storage, clusters,
//! environments, ports), its `CloudServiceBuilder`, and the `Stepper`
//! progress reporter. Two reference backends ship with it: `MockBackend`, an
//! in-memory backend with fault injection, and `LocalBackend`, a simulated
//! provider that persists the record on disk.

pub mod backend;
pub mod local;
pub mod mock;
pub mod stepper;

pub use backend::{
    check_instance_type, select_backend, CloudService, CloudServiceBuilder, NamedBackendBuilder,
    SharedServiceBuilder, VALID_INSTANCE_TYPES,
};
pub use local::LocalBackend;
pub use mock::{MockBackend, Operation};
pub use stepper::{LogStepper, NoopStepper, Stepper};

use outpost_schema::SchemaError;
use outpost_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("outpost is not installed")]
    NotInstalled,
    #[error("invalid instance type '{0}' (expected one of: {expected})", expected = VALID_INSTANCE_TYPES.join(", "))]
    InvalidInstanceType(String),
    #[error("backend '{0}' is not available")]
    Unavailable(String),
    #[error("{operation} failed: {reason}")]
    Failed { operation: String, reason: String },
    #[error("backend store error: {0}")]
    Store(StoreError),
    #[error("backend I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("backend schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("backend serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BackendError {
    pub fn failed(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for BackendError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotInstalled(_) => Self::NotInstalled,
            other => Self::Store(other),
        }
    }
}
