use crate::stepper::Stepper;
use crate::BackendError;
use outpost_schema::{Cluster, Config, Env};
use std::path::PathBuf;
use std::sync::Arc;

/// Instance types understood by the reference backends.
pub const VALID_INSTANCE_TYPES: &[&str] = &["small", "medium", "large", "xlarge"];

/// Remote provisioning backend.
///
/// Entities are passed `&mut` wherever the backend may populate them (for
/// example the infrastructure descriptor). Those writes stay visible to the
/// caller even when the call returns an error, so the caller can persist the
/// partial state before surfacing the failure.
pub trait CloudService: Send + Sync {
    fn name(&self) -> &str;

    fn create_config_storage(&self, stepper: &dyn Stepper) -> Result<(), BackendError>;

    fn remove_config_storage(&self, stepper: &dyn Stepper) -> Result<(), BackendError>;

    /// Load the configuration record. Fails with [`BackendError::NotInstalled`]
    /// when no record exists yet.
    fn lookup_config(&self, stepper: &dyn Stepper) -> Result<Config, BackendError>;

    fn save_config(&self, stepper: &dyn Stepper, config: &Config) -> Result<(), BackendError>;

    fn create_cluster(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError>;

    fn remove_cluster(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError>;

    fn check_instance_type_validity(
        &self,
        stepper: &dyn Stepper,
        instance_type: &str,
    ) -> Result<(), BackendError>;

    fn create_env(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError>;

    fn remove_env(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError>;

    fn open_port(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError>;

    fn close_port(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError>;
}

impl<T: CloudService + ?Sized> CloudService for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn create_config_storage(&self, stepper: &dyn Stepper) -> Result<(), BackendError> {
        (**self).create_config_storage(stepper)
    }

    fn remove_config_storage(&self, stepper: &dyn Stepper) -> Result<(), BackendError> {
        (**self).remove_config_storage(stepper)
    }

    fn lookup_config(&self, stepper: &dyn Stepper) -> Result<Config, BackendError> {
        (**self).lookup_config(stepper)
    }

    fn save_config(&self, stepper: &dyn Stepper, config: &Config) -> Result<(), BackendError> {
        (**self).save_config(stepper, config)
    }

    fn create_cluster(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError> {
        (**self).create_cluster(stepper, config, cluster)
    }

    fn remove_cluster(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError> {
        (**self).remove_cluster(stepper, config, cluster)
    }

    fn check_instance_type_validity(
        &self,
        stepper: &dyn Stepper,
        instance_type: &str,
    ) -> Result<(), BackendError> {
        (**self).check_instance_type_validity(stepper, instance_type)
    }

    fn create_env(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError> {
        (**self).create_env(stepper, config, cluster, env)
    }

    fn remove_env(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError> {
        (**self).remove_env(stepper, config, cluster, env)
    }

    fn open_port(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError> {
        (**self).open_port(stepper, config, cluster, env, port)
    }

    fn close_port(
        &self,
        stepper: &dyn Stepper,
        config: &Config,
        cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError> {
        (**self).close_port(stepper, config, cluster, env, port)
    }
}

/// Produces a backend handle at the start of every workflow invocation.
pub trait CloudServiceBuilder {
    fn build(&self) -> Result<Box<dyn CloudService>, BackendError>;
}

/// Hands out the same backend instance on every build.
pub struct SharedServiceBuilder<T: CloudService + 'static> {
    service: Arc<T>,
}

impl<T: CloudService + 'static> SharedServiceBuilder<T> {
    pub fn new(service: Arc<T>) -> Self {
        Self { service }
    }
}

impl<T: CloudService + 'static> CloudServiceBuilder for SharedServiceBuilder<T> {
    fn build(&self) -> Result<Box<dyn CloudService>, BackendError> {
        Ok(Box::new(Arc::clone(&self.service)))
    }
}

/// Builds a backend by name via [`select_backend`].
#[derive(Debug, Clone)]
pub struct NamedBackendBuilder {
    name: String,
    root: PathBuf,
}

impl NamedBackendBuilder {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }
}

impl CloudServiceBuilder for NamedBackendBuilder {
    fn build(&self) -> Result<Box<dyn CloudService>, BackendError> {
        select_backend(&self.name, self.root.clone())
    }
}

pub fn select_backend(
    name: &str,
    root: impl Into<PathBuf>,
) -> Result<Box<dyn CloudService>, BackendError> {
    match name {
        "local" => Ok(Box::new(crate::local::LocalBackend::new(root))),
        "mock" => Ok(Box::new(crate::mock::MockBackend::new())),
        other => Err(BackendError::Unavailable(other.to_owned())),
    }
}

pub fn check_instance_type(instance_type: &str) -> Result<(), BackendError> {
    if VALID_INSTANCE_TYPES.contains(&instance_type) {
        Ok(())
    } else {
        Err(BackendError::InvalidInstanceType(instance_type.to_owned()))
    }
}
