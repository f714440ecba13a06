use crate::cluster::Cluster;
use crate::env::Env;
use crate::SchemaError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current configuration record format. Incremented on incompatible changes.
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Root of the durable record mirroring what is believed to exist remotely.
///
/// Getters hand out owned copies; callers mutate the copy and write it back
/// with the matching setter before persisting the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub version: u32,
    #[serde(default)]
    pub clusters: BTreeMap<String, Cluster>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            clusters: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_cluster(&self, cluster_name: &str) -> Result<Cluster, SchemaError> {
        self.clusters
            .get(cluster_name)
            .cloned()
            .ok_or_else(|| SchemaError::ClusterNotFound(cluster_name.to_owned()))
    }

    /// Insert or replace a cluster, keeping the environments already recorded
    /// under that name.
    pub fn set_cluster(&mut self, mut cluster: Cluster) {
        cluster.envs = self
            .clusters
            .remove(&cluster.name)
            .map(|existing| existing.envs)
            .unwrap_or_default();
        self.clusters.insert(cluster.name.clone(), cluster);
    }

    pub fn remove_cluster(&mut self, cluster_name: &str) -> Result<(), SchemaError> {
        self.clusters
            .remove(cluster_name)
            .map(|_| ())
            .ok_or_else(|| SchemaError::ClusterNotFound(cluster_name.to_owned()))
    }

    pub fn get_env(&self, cluster_name: &str, env_name: &str) -> Result<Env, SchemaError> {
        self.cluster_ref(cluster_name)?
            .envs
            .get(env_name)
            .cloned()
            .ok_or_else(|| SchemaError::EnvNotFound {
                cluster_name: cluster_name.to_owned(),
                env_name: env_name.to_owned(),
            })
    }

    pub fn set_env(&mut self, cluster_name: &str, env: Env) -> Result<(), SchemaError> {
        let cluster = self.cluster_mut(cluster_name)?;
        cluster.envs.insert(env.name.clone(), env);
        Ok(())
    }

    pub fn remove_env(&mut self, cluster_name: &str, env_name: &str) -> Result<(), SchemaError> {
        let cluster = self.cluster_mut(cluster_name)?;
        cluster
            .envs
            .remove(env_name)
            .map(|_| ())
            .ok_or_else(|| SchemaError::EnvNotFound {
                cluster_name: cluster_name.to_owned(),
                env_name: env_name.to_owned(),
            })
    }

    pub fn count_envs_in_cluster(&self, cluster_name: &str) -> Result<usize, SchemaError> {
        Ok(self.cluster_ref(cluster_name)?.envs.len())
    }

    /// Every recorded environment paired with the name of its cluster.
    pub fn envs(&self) -> impl Iterator<Item = (&str, &Env)> {
        self.clusters.values().flat_map(|cluster| {
            cluster
                .envs
                .values()
                .map(move |env| (cluster.name.as_str(), env))
        })
    }

    fn cluster_ref(&self, cluster_name: &str) -> Result<&Cluster, SchemaError> {
        self.clusters
            .get(cluster_name)
            .ok_or_else(|| SchemaError::ClusterNotFound(cluster_name.to_owned()))
    }

    fn cluster_mut(&mut self, cluster_name: &str) -> Result<&mut Cluster, SchemaError> {
        self.clusters
            .get_mut(cluster_name)
            .ok_or_else(|| SchemaError::ClusterNotFound(cluster_name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterStatus;
    use crate::repository::ResolvedRepository;

    fn sample_env(name: &str) -> Env {
        let repo = ResolvedRepository::resolve(name, "octo").unwrap();
        Env::new(name, "small", repo)
    }

    fn config_with_cluster() -> Config {
        let mut config = Config::new();
        config.set_cluster(Cluster::new("default", "small", true));
        config
    }

    #[test]
    fn missing_cluster_is_not_found() {
        let config = Config::new();
        assert!(matches!(
            config.get_cluster("default"),
            Err(SchemaError::ClusterNotFound(name)) if name == "default"
        ));
        assert!(matches!(
            config.get_env("default", "octo/a"),
            Err(SchemaError::ClusterNotFound(_))
        ));
    }

    #[test]
    fn set_and_get_env() {
        let mut config = config_with_cluster();
        let env = sample_env("octo/a");
        config.set_env("default", env.clone()).unwrap();

        assert_eq!(config.get_env("default", "octo/a").unwrap(), env);
        assert_eq!(config.count_envs_in_cluster("default").unwrap(), 1);
    }

    #[test]
    fn missing_env_is_not_found() {
        let config = config_with_cluster();
        assert!(matches!(
            config.get_env("default", "octo/a"),
            Err(SchemaError::EnvNotFound { .. })
        ));
    }

    #[test]
    fn set_env_replaces_by_name() {
        let mut config = config_with_cluster();
        let mut env = sample_env("octo/a");
        config.set_env("default", env.clone()).unwrap();

        env.instance_public_ip_address = "10.0.0.1".to_owned();
        config.set_env("default", env).unwrap();

        assert_eq!(config.count_envs_in_cluster("default").unwrap(), 1);
        assert_eq!(
            config
                .get_env("default", "octo/a")
                .unwrap()
                .instance_public_ip_address,
            "10.0.0.1"
        );
    }

    #[test]
    fn set_cluster_keeps_recorded_envs() {
        let mut config = config_with_cluster();
        let stale = config.get_cluster("default").unwrap();
        config.set_env("default", sample_env("octo/a")).unwrap();

        let mut updated = stale;
        updated.status = ClusterStatus::Created;
        config.set_cluster(updated);

        let cluster = config.get_cluster("default").unwrap();
        assert_eq!(cluster.status, ClusterStatus::Created);
        assert_eq!(cluster.envs.len(), 1);
    }

    #[test]
    fn remove_env_and_cluster() {
        let mut config = config_with_cluster();
        config.set_env("default", sample_env("octo/a")).unwrap();

        config.remove_env("default", "octo/a").unwrap();
        assert_eq!(config.count_envs_in_cluster("default").unwrap(), 0);
        assert!(config.remove_env("default", "octo/a").is_err());

        config.remove_cluster("default").unwrap();
        assert!(config.clusters.is_empty());
        assert!(config.remove_cluster("default").is_err());
    }

    #[test]
    fn envs_iterates_with_cluster_names() {
        let mut config = config_with_cluster();
        config.set_env("default", sample_env("octo/a")).unwrap();
        config.set_env("default", sample_env("octo/b")).unwrap();

        let names: Vec<(&str, &str)> = config
            .envs()
            .map(|(cluster, env)| (cluster, env.name.as_str()))
            .collect();
        assert_eq!(names, vec![("default", "octo/a"), ("default", "octo/b")]);
    }

    #[test]
    fn record_serde_roundtrip_keeps_ports() {
        let mut config = config_with_cluster();
        let mut env = sample_env("octo/a");
        env.opened_ports.insert(8080);
        config.set_env("default", env).unwrap();

        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(back.get_env("default", "octo/a").unwrap().is_port_opened(8080));
    }
}
