use crate::actions;
use crate::engine::{Engine, OutputHandler};
use crate::lifecycle::{
    ensure_env_initializable, validate_cluster_transition, validate_env_transition,
};
use crate::CoreError;
use outpost_runtime::{BackendError, CloudService};
use outpost_schema::{
    build_env_name_from_repository, Cluster, ClusterStatus, Config, Env, EnvStatus,
    ResolvedRepository, SchemaError, DEFAULT_CLUSTER_NAME,
};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitInput {
    pub cluster_name: String,
    pub instance_type: String,
    pub repository: ResolvedRepository,
}

impl InitInput {
    pub fn new(repository: ResolvedRepository, instance_type: impl Into<String>) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            instance_type: instance_type.into(),
            repository,
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }
}

/// First-phase result of an init: everything needed to bootstrap the
/// environment and then call [`Engine::complete_init`].
pub struct InitHandle {
    pub backend: Box<dyn CloudService>,
    pub config: Config,
    pub cluster: Cluster,
    pub env: Env,
    /// `false` when the environment was already `Created` and nothing was
    /// provisioned.
    pub env_created: bool,
}

impl fmt::Debug for InitHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitHandle")
            .field("backend", &self.backend.name())
            .field("cluster", &self.cluster.name)
            .field("env", &self.env.name)
            .field("env_created", &self.env_created)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Install if needed, then create (or resume creating) the cluster and
    /// the environment for `input.repository`.
    ///
    /// Resources left in `Creating` by an interrupted run are reused with
    /// their recorded identity. An environment being removed cannot be
    /// initialized.
    pub fn begin_init(
        &self,
        input: InitInput,
        handler: &mut dyn OutputHandler<InitHandle>,
    ) -> Result<InitHandle, CoreError> {
        let result = self.run_begin_init(input);
        self.report(handler, result)
    }

    /// Mark the environment of a finished init as `Created` and persist it.
    pub fn complete_init(&self, handle: &mut InitHandle) -> Result<(), CoreError> {
        validate_env_transition(&handle.env.name, handle.env.status, EnvStatus::Created)?;
        handle.env.status = EnvStatus::Created;
        actions::update_env_in_config(
            self.stepper(),
            handle.backend.as_ref(),
            &mut handle.config,
            &handle.cluster,
            &handle.env,
        )?;
        info!("environment {} is ready", handle.env.name);
        Ok(())
    }

    fn run_begin_init(&self, input: InitInput) -> Result<InitHandle, CoreError> {
        let stepper = self.stepper();
        let env_name = build_env_name_from_repository(&input.repository);
        info!("initializing {env_name} in cluster {}", input.cluster_name);
        let step = format!("Initializing an environment for \"{env_name}\"");
        stepper.start_temporary_step(&step);

        let backend = self.build_backend()?;
        backend.check_instance_type_validity(stepper, &input.instance_type)?;

        let mut config = match backend.lookup_config(stepper) {
            Ok(config) => config,
            Err(BackendError::NotInstalled) => {
                stepper.start_temporary_step("Installing Outpost");
                let config = Config::new();
                actions::install(stepper, backend.as_ref(), &config)?;
                config
            }
            Err(e) => return Err(e.into()),
        };

        let existing_cluster = match config.get_cluster(&input.cluster_name) {
            Ok(cluster) => Some(cluster),
            Err(SchemaError::ClusterNotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };
        let cluster = match existing_cluster {
            Some(cluster) if cluster.status == ClusterStatus::Created => cluster,
            existing => {
                let mut cluster = match existing {
                    Some(cluster) => {
                        validate_cluster_transition(
                            &cluster.name,
                            cluster.status,
                            ClusterStatus::Created,
                        )?;
                        cluster
                    }
                    None => Cluster::new(
                        input.cluster_name.clone(),
                        input.instance_type.clone(),
                        input.cluster_name == DEFAULT_CLUSTER_NAME,
                    ),
                };
                stepper.start_temporary_step(&format!("Creating {} cluster", cluster.name));
                actions::create_cluster(stepper, backend.as_ref(), &mut config, &mut cluster)?;
                cluster
            }
        };

        let existing_env = match config.get_env(&cluster.name, &env_name) {
            Ok(env) => Some(env),
            Err(SchemaError::EnvNotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        if let Some(env) = &existing_env {
            ensure_env_initializable(env)?;
        }

        let (env, env_created) = match existing_env {
            Some(env) if env.status == EnvStatus::Created => (env, false),
            existing => {
                let mut env = match existing {
                    Some(env) => env,
                    None => Env::new(env_name, input.instance_type, input.repository),
                };
                actions::create_env(stepper, backend.as_ref(), &mut config, &cluster, &mut env)?;
                (env, true)
            }
        };

        stepper.start_temporary_step(&step);
        Ok(InitHandle {
            backend,
            config,
            cluster,
            env,
            env_created,
        })
    }
}
