use crate::actions;
use crate::engine::{Engine, OutputHandler};
use crate::CoreError;
use outpost_runtime::CloudService;
use outpost_schema::{
    build_env_name_from_repository, Cluster, Config, Env, ResolvedRepository,
    DEFAULT_CLUSTER_NAME,
};
use tracing::info;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Runs after the backend teardown has been saved and before the record
/// entry is erased. An error keeps the environment recorded as `Removing`.
pub trait PreRemoveHook {
    fn run(
        &mut self,
        backend: &dyn CloudService,
        config: &Config,
        cluster: &Cluster,
        env: &Env,
    ) -> Result<(), BoxError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl PreRemoveHook for NoopHook {
    fn run(
        &mut self,
        _backend: &dyn CloudService,
        _config: &Config,
        _cluster: &Cluster,
        _env: &Env,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}

/// Asks whether an environment should really be removed.
pub trait RemoveConfirmation {
    fn confirm(&mut self, env: &Env) -> Result<bool, BoxError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl RemoveConfirmation for AlwaysConfirm {
    fn confirm(&mut self, _env: &Env) -> Result<bool, BoxError> {
        Ok(true)
    }
}

pub struct RemoveInput {
    pub cluster_name: String,
    pub repository: ResolvedRepository,
    /// Skip the confirmation step.
    pub force: bool,
    pub confirmation: Box<dyn RemoveConfirmation>,
    pub hook: Box<dyn PreRemoveHook>,
}

impl RemoveInput {
    pub fn new(repository: ResolvedRepository) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            repository,
            force: false,
            confirmation: Box::new(AlwaysConfirm),
            hook: Box::new(NoopHook),
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    #[must_use]
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    #[must_use]
    pub fn with_confirmation(mut self, confirmation: impl RemoveConfirmation + 'static) -> Self {
        self.confirmation = Box::new(confirmation);
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: impl PreRemoveHook + 'static) -> Self {
        self.hook = Box::new(hook);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RemoveContent {
    pub cluster: Cluster,
    /// The environment as it was last recorded, before its entry was erased.
    pub env: Env,
    /// `false` when the user declined; nothing was removed.
    pub confirmed: bool,
}

impl Engine {
    /// Tear down the environment for `input.repository`, whatever its
    /// current status.
    pub fn remove(
        &self,
        input: RemoveInput,
        handler: &mut dyn OutputHandler<RemoveContent>,
    ) -> Result<RemoveContent, CoreError> {
        let result = self.run_remove(input);
        self.report(handler, result)
    }

    fn run_remove(&self, mut input: RemoveInput) -> Result<RemoveContent, CoreError> {
        let stepper = self.stepper();
        let env_name = build_env_name_from_repository(&input.repository);
        info!("removing {env_name} from cluster {}", input.cluster_name);
        let step = format!("Removing the environment for \"{env_name}\"");
        stepper.start_temporary_step(&step);

        let mut resolved = self.resolve_env(&input.cluster_name, &env_name)?;

        if !input.force {
            stepper.stop_current_step();
            let confirmed = input
                .confirmation
                .confirm(&resolved.env)
                .map_err(CoreError::Confirmation)?;
            if !confirmed {
                info!("removal of {env_name} declined");
                return Ok(RemoveContent {
                    cluster: resolved.cluster,
                    env: resolved.env,
                    confirmed: false,
                });
            }
            stepper.start_temporary_step(&step);
        }

        actions::remove_env(
            stepper,
            resolved.backend.as_ref(),
            &mut resolved.config,
            &resolved.cluster,
            &mut resolved.env,
            input.hook.as_mut(),
        )?;

        Ok(RemoveContent {
            cluster: resolved.cluster,
            env: resolved.env,
            confirmed: true,
        })
    }
}
