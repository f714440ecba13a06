//! In-memory backend with fault injection and a call journal.

use crate::backend::{check_instance_type, CloudService};
use crate::stepper::Stepper;
use crate::BackendError;
use outpost_schema::{parse_ssh_host_keys, Cluster, Config, Env, EnvId};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    CreateConfigStorage,
    RemoveConfigStorage,
    LookupConfig,
    SaveConfig,
    CreateCluster,
    RemoveCluster,
    CheckInstanceType,
    CreateEnv,
    RemoveEnv,
    OpenPort,
    ClosePort,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::CreateConfigStorage => "create_config_storage",
            Operation::RemoveConfigStorage => "remove_config_storage",
            Operation::LookupConfig => "lookup_config",
            Operation::SaveConfig => "save_config",
            Operation::CreateCluster => "create_cluster",
            Operation::RemoveCluster => "remove_cluster",
            Operation::CheckInstanceType => "check_instance_type",
            Operation::CreateEnv => "create_env",
            Operation::RemoveEnv => "remove_env",
            Operation::OpenPort => "open_port",
            Operation::ClosePort => "close_port",
        };
        f.write_str(name)
    }
}

#[derive(Default)]
struct MockState {
    storage_created: bool,
    stored: Option<Config>,
    failing: HashSet<Operation>,
    calls: Vec<Operation>,
    clusters: BTreeSet<String>,
    /// Provisioned environments and the ports opened on each.
    envs: BTreeMap<EnvId, BTreeSet<u16>>,
    next_host: u8,
}

/// Backend that keeps everything in memory.
///
/// Every call is journaled. Operations marked with [`fail`](Self::fail) keep
/// failing until [`heal`](Self::heal)ed; failing create calls still write a
/// partial infrastructure descriptor into the entity, like a real provider
/// that errors halfway through.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: Operation) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.insert(op);
        }
    }

    pub fn heal(&self, op: Operation) {
        if let Ok(mut state) = self.state.lock() {
            state.failing.remove(&op);
        }
    }

    pub fn calls(&self) -> Vec<Operation> {
        self.state
            .lock()
            .map(|s| s.calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.calls().into_iter().filter(|c| *c == op).count()
    }

    pub fn clear_calls(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.calls.clear();
        }
    }

    pub fn has_storage(&self) -> bool {
        self.state.lock().is_ok_and(|s| s.storage_created)
    }

    /// The record as last saved, bypassing fault injection.
    pub fn stored_config(&self) -> Option<Config> {
        self.state.lock().ok().and_then(|s| s.stored.clone())
    }

    pub fn remote_clusters(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.clusters.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remote_env_ids(&self) -> Vec<EnvId> {
        self.state
            .lock()
            .map(|s| s.envs.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remote_open_ports(&self, env_id: &EnvId) -> Option<BTreeSet<u16>> {
        self.state.lock().ok().and_then(|s| s.envs.get(env_id).cloned())
    }

    /// Journal `op` and report whether it was set up to fail.
    fn begin(&self, op: Operation) -> Result<(MutexGuard<'_, MockState>, bool), BackendError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| BackendError::failed(op.to_string(), format!("mutex poisoned: {e}")))?;
        state.calls.push(op);
        let failing = state.failing.contains(&op);
        Ok((state, failing))
    }
}

fn injected(op: Operation) -> BackendError {
    BackendError::failed(op.to_string(), "injected failure")
}

impl CloudService for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn create_config_storage(&self, _stepper: &dyn Stepper) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::CreateConfigStorage)?;
        if failing {
            return Err(injected(Operation::CreateConfigStorage));
        }
        state.storage_created = true;
        Ok(())
    }

    fn remove_config_storage(&self, _stepper: &dyn Stepper) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::RemoveConfigStorage)?;
        if failing {
            return Err(injected(Operation::RemoveConfigStorage));
        }
        state.storage_created = false;
        state.stored = None;
        Ok(())
    }

    fn lookup_config(&self, _stepper: &dyn Stepper) -> Result<Config, BackendError> {
        let (state, failing) = self.begin(Operation::LookupConfig)?;
        if failing {
            return Err(injected(Operation::LookupConfig));
        }
        match (&state.stored, state.storage_created) {
            (Some(config), true) => Ok(config.clone()),
            _ => Err(BackendError::NotInstalled),
        }
    }

    fn save_config(&self, _stepper: &dyn Stepper, config: &Config) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::SaveConfig)?;
        if failing {
            return Err(injected(Operation::SaveConfig));
        }
        if !state.storage_created {
            return Err(BackendError::NotInstalled);
        }
        state.stored = Some(config.clone());
        Ok(())
    }

    fn create_cluster(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::CreateCluster)?;
        let network = format!("net-{}", cluster.name);
        if failing {
            cluster.set_infrastructure_json(
                &serde_json::json!({ "network": network, "complete": false }),
            )?;
            return Err(injected(Operation::CreateCluster));
        }
        cluster.set_infrastructure_json(
            &serde_json::json!({ "network": network, "complete": true }),
        )?;
        state.clusters.insert(cluster.name.clone());
        Ok(())
    }

    fn remove_cluster(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        cluster: &mut Cluster,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::RemoveCluster)?;
        if failing {
            cluster.set_infrastructure_json(&serde_json::json!({ "teardown_started": true }))?;
            return Err(injected(Operation::RemoveCluster));
        }
        state.clusters.remove(&cluster.name);
        cluster.infrastructure_json.clear();
        Ok(())
    }

    fn check_instance_type_validity(
        &self,
        _stepper: &dyn Stepper,
        instance_type: &str,
    ) -> Result<(), BackendError> {
        let (_state, failing) = self.begin(Operation::CheckInstanceType)?;
        if failing {
            return Err(injected(Operation::CheckInstanceType));
        }
        check_instance_type(instance_type)
    }

    fn create_env(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::CreateEnv)?;
        let key_pair = env.ssh_key_pair_name();
        if failing {
            env.set_infrastructure_json(&serde_json::json!({
                "cluster": cluster.name,
                "key_pair": key_pair,
                "instance_id": null,
                "complete": false,
            }))?;
            return Err(injected(Operation::CreateEnv));
        }

        state.next_host = state.next_host.wrapping_add(1).max(1);
        let slug = env.name_slug();
        env.set_infrastructure_json(&serde_json::json!({
            "cluster": cluster.name,
            "key_pair": key_pair,
            "instance_id": format!("i-{slug}"),
            "complete": true,
        }))?;
        env.instance_public_ip_address = format!("10.0.0.{}", state.next_host);
        env.ssh_host_keys = parse_ssh_host_keys(&format!(
            "ssh-ed25519 AAAAC3{slug} root@mock\nssh-rsa AAAAB3{slug} root@mock"
        ))?;
        env.ssh_key_pair_pem_content = format!("-----BEGIN MOCK KEY-----\n{slug}\n-----END MOCK KEY-----");
        state.envs.entry(env.id.clone()).or_default();
        Ok(())
    }

    fn remove_env(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        _cluster: &Cluster,
        env: &mut Env,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::RemoveEnv)?;
        if failing {
            env.set_infrastructure_json(&serde_json::json!({
                "key_pair": env.ssh_key_pair_name(),
                "teardown_started": true,
            }))?;
            return Err(injected(Operation::RemoveEnv));
        }
        state.envs.remove(&env.id);
        env.infrastructure_json.clear();
        Ok(())
    }

    fn open_port(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        _cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::OpenPort)?;
        if failing {
            return Err(injected(Operation::OpenPort));
        }
        let ports = state.envs.get_mut(&env.id).ok_or_else(|| {
            BackendError::failed(Operation::OpenPort.to_string(), "environment not provisioned")
        })?;
        ports.insert(port);
        Ok(())
    }

    fn close_port(
        &self,
        _stepper: &dyn Stepper,
        _config: &Config,
        _cluster: &Cluster,
        env: &mut Env,
        port: u16,
    ) -> Result<(), BackendError> {
        let (mut state, failing) = self.begin(Operation::ClosePort)?;
        if failing {
            return Err(injected(Operation::ClosePort));
        }
        let ports = state.envs.get_mut(&env.id).ok_or_else(|| {
            BackendError::failed(Operation::ClosePort.to_string(), "environment not provisioned")
        })?;
        ports.remove(&port);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stepper::NoopStepper;
    use outpost_schema::ResolvedRepository;

    fn sample_env() -> Env {
        let repo = ResolvedRepository::resolve("octo/hello", "octo").unwrap();
        Env::new("octo/hello", "small", repo)
    }

    #[test]
    fn lookup_without_storage_is_not_installed() {
        let backend = MockBackend::new();
        assert!(matches!(
            backend.lookup_config(&NoopStepper),
            Err(BackendError::NotInstalled)
        ));
    }

    #[test]
    fn storage_roundtrip() {
        let backend = MockBackend::new();
        backend.create_config_storage(&NoopStepper).unwrap();
        assert!(matches!(
            backend.lookup_config(&NoopStepper),
            Err(BackendError::NotInstalled)
        ));
        backend.save_config(&NoopStepper, &Config::new()).unwrap();
        assert_eq!(backend.lookup_config(&NoopStepper).unwrap(), Config::new());

        backend.remove_config_storage(&NoopStepper).unwrap();
        assert!(!backend.has_storage());
        assert!(backend.stored_config().is_none());
    }

    #[test]
    fn injected_create_failure_leaves_partial_descriptor() {
        let backend = MockBackend::new();
        let cluster = Cluster::new("default", "small", true);
        let mut env = sample_env();

        backend.fail(Operation::CreateEnv);
        let err = backend
            .create_env(&NoopStepper, &Config::new(), &cluster, &mut env)
            .unwrap_err();
        assert!(err.to_string().contains("injected failure"));
        assert!(env.infrastructure_json.contains("\"complete\":false"));
        assert!(backend.remote_env_ids().is_empty());

        backend.heal(Operation::CreateEnv);
        backend
            .create_env(&NoopStepper, &Config::new(), &cluster, &mut env)
            .unwrap();
        assert!(env.infrastructure_json.contains("\"complete\":true"));
        assert_eq!(env.ssh_host_keys.len(), 2);
        assert!(!env.instance_public_ip_address.is_empty());
        assert_eq!(backend.remote_env_ids(), vec![env.id.clone()]);
    }

    #[test]
    fn ports_require_provisioned_env() {
        let backend = MockBackend::new();
        let cluster = Cluster::new("default", "small", true);
        let mut env = sample_env();

        assert!(backend
            .open_port(&NoopStepper, &Config::new(), &cluster, &mut env, 8080)
            .is_err());

        backend
            .create_env(&NoopStepper, &Config::new(), &cluster, &mut env)
            .unwrap();
        backend
            .open_port(&NoopStepper, &Config::new(), &cluster, &mut env, 8080)
            .unwrap();
        assert!(backend.remote_open_ports(&env.id).unwrap().contains(&8080));

        backend
            .close_port(&NoopStepper, &Config::new(), &cluster, &mut env, 8080)
            .unwrap();
        assert!(backend.remote_open_ports(&env.id).unwrap().is_empty());
    }

    #[test]
    fn calls_are_journaled() {
        let backend = MockBackend::new();
        backend.fail(Operation::CheckInstanceType);
        let _ = backend.check_instance_type_validity(&NoopStepper, "small");
        let _ = backend.lookup_config(&NoopStepper);

        assert_eq!(
            backend.calls(),
            vec![Operation::CheckInstanceType, Operation::LookupConfig]
        );
        assert_eq!(backend.call_count(Operation::LookupConfig), 1);

        backend.clear_calls();
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn instance_type_is_validated() {
        let backend = MockBackend::new();
        assert!(backend
            .check_instance_type_validity(&NoopStepper, "small")
            .is_ok());
        assert!(matches!(
            backend.check_instance_type_validity(&NoopStepper, "gigantic"),
            Err(BackendError::InvalidInstanceType(_))
        ));
    }
}
