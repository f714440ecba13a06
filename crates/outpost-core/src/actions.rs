//! Single-resource primitives.
//!
//! Every primitive performs one remote mutation and then saves the record,
//! whatever the remote outcome. The entity passed in may have been partially
//! populated by a failing backend call; saving it anyway means a retry sees
//! what was actually created. When both the remote call and the save fail, the
//! save error wins.

use crate::lifecycle::{validate_cluster_transition, validate_env_transition};
use crate::remove::PreRemoveHook;
use crate::CoreError;
use outpost_runtime::{BackendError, CloudService, Stepper};
use outpost_schema::{Cluster, ClusterStatus, Config, Env, EnvStatus};
use tracing::{debug, warn};

/// Provision storage for a fresh record and persist it.
pub fn install(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &Config,
) -> Result<(), CoreError> {
    debug!("creating configuration storage");
    backend.create_config_storage(stepper)?;
    save(stepper, backend, config)
}

pub fn save(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &Config,
) -> Result<(), CoreError> {
    backend
        .save_config(stepper, config)
        .map_err(CoreError::Persistence)
}

fn save_through(
    remote: Result<(), BackendError>,
    saved: Result<(), CoreError>,
) -> Result<(), CoreError> {
    match (remote, saved) {
        (Err(remote_err), Err(save_err)) => {
            warn!("backend error masked by failed save: {remote_err}");
            Err(save_err)
        }
        (_, Err(save_err)) => Err(save_err),
        (Err(remote_err), Ok(())) => Err(remote_err.into()),
        (Ok(()), Ok(())) => Ok(()),
    }
}

pub fn update_cluster_in_config(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
) -> Result<(), CoreError> {
    config.set_cluster(cluster.clone());
    save(stepper, backend, config)
}

pub fn remove_cluster_in_config(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
) -> Result<(), CoreError> {
    config.remove_cluster(&cluster.name)?;
    save(stepper, backend, config)
}

pub fn update_env_in_config(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &Env,
) -> Result<(), CoreError> {
    config.set_env(&cluster.name, env.clone())?;
    save(stepper, backend, config)
}

pub fn remove_env_in_config(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &Env,
) -> Result<(), CoreError> {
    config.remove_env(&cluster.name, &env.name)?;
    save(stepper, backend, config)
}

pub fn create_cluster(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &mut Cluster,
) -> Result<(), CoreError> {
    debug!("creating cluster {}", cluster.name);
    let remote = backend.create_cluster(stepper, config, cluster);
    let saved = update_cluster_in_config(stepper, backend, config, cluster);
    save_through(remote, saved)?;

    validate_cluster_transition(&cluster.name, cluster.status, ClusterStatus::Created)?;
    cluster.status = ClusterStatus::Created;
    update_cluster_in_config(stepper, backend, config, cluster)
}

pub fn remove_cluster(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &mut Cluster,
) -> Result<(), CoreError> {
    debug!("removing cluster {}", cluster.name);
    validate_cluster_transition(&cluster.name, cluster.status, ClusterStatus::Removing)?;
    cluster.status = ClusterStatus::Removing;
    update_cluster_in_config(stepper, backend, config, cluster)?;

    let remote = backend.remove_cluster(stepper, config, cluster);
    let saved = update_cluster_in_config(stepper, backend, config, cluster);
    save_through(remote, saved)?;

    remove_cluster_in_config(stepper, backend, config, cluster)
}

/// Provision an environment. The status stays `Creating`; the caller flips
/// it to `Created` once post-provisioning bootstrap has finished.
pub fn create_env(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &mut Env,
) -> Result<(), CoreError> {
    debug!("creating environment {} ({})", env.name, env.id);
    let remote = backend.create_env(stepper, config, cluster, env);
    let saved = update_env_in_config(stepper, backend, config, cluster, env);
    save_through(remote, saved)
}

/// Tear an environment down. The hook runs after the backend removal has
/// been saved and before the entry is erased; a failing hook leaves the
/// environment recorded as `Removing`.
pub fn remove_env(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &mut Env,
    hook: &mut dyn PreRemoveHook,
) -> Result<(), CoreError> {
    debug!("removing environment {} ({})", env.name, env.id);
    validate_env_transition(&env.name, env.status, EnvStatus::Removing)?;
    env.status = EnvStatus::Removing;
    update_env_in_config(stepper, backend, config, cluster, env)?;

    let remote = backend.remove_env(stepper, config, cluster, env);
    let saved = update_env_in_config(stepper, backend, config, cluster, env);
    save_through(remote, saved)?;

    hook.run(backend, config, cluster, env)
        .map_err(CoreError::Hook)?;

    remove_env_in_config(stepper, backend, config, cluster, env)
}

/// The port set is only updated once the backend has opened the port.
pub fn open_port(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &mut Env,
    port: u16,
) -> Result<(), CoreError> {
    debug!("opening port {port} on {}", env.name);
    let remote = backend.open_port(stepper, config, cluster, env, port);
    if remote.is_ok() {
        env.opened_ports.insert(port);
    }
    let saved = update_env_in_config(stepper, backend, config, cluster, env);
    save_through(remote, saved)
}

pub fn close_port(
    stepper: &dyn Stepper,
    backend: &dyn CloudService,
    config: &mut Config,
    cluster: &Cluster,
    env: &mut Env,
    port: u16,
) -> Result<(), CoreError> {
    debug!("closing port {port} on {}", env.name);
    let remote = backend.close_port(stepper, config, cluster, env, port);
    if remote.is_ok() {
        env.opened_ports.remove(&port);
    }
    let saved = update_env_in_config(stepper, backend, config, cluster, env);
    save_through(remote, saved)
}
