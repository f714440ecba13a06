use crate::engine::{Engine, OutputHandler};
use crate::lifecycle::ensure_env_ready;
use crate::CoreError;
use outpost_schema::{
    build_env_name_from_repository, Cluster, Env, ResolvedRepository, DEFAULT_CLUSTER_NAME,
};
use tracing::info;

#[derive(Debug, Clone)]
pub struct EditInput {
    pub cluster_name: String,
    pub repository: ResolvedRepository,
}

impl EditInput {
    pub fn new(repository: ResolvedRepository) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            repository,
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct EditContent {
    pub cluster: Cluster,
    pub env: Env,
}

impl Engine {
    /// Look up a `Created` environment for an external editor. Mutates nothing.
    pub fn edit(
        &self,
        input: EditInput,
        handler: &mut dyn OutputHandler<EditContent>,
    ) -> Result<EditContent, CoreError> {
        let result = self.run_edit(&input);
        self.report(handler, result)
    }

    fn run_edit(&self, input: &EditInput) -> Result<EditContent, CoreError> {
        let env_name = build_env_name_from_repository(&input.repository);
        info!("editing {env_name}");
        self.stepper()
            .start_temporary_step(&format!("Editing the environment for \"{env_name}\""));

        let resolved = self.resolve_env(&input.cluster_name, &env_name)?;
        ensure_env_ready("edit", &resolved.env)?;

        Ok(EditContent {
            cluster: resolved.cluster,
            env: resolved.env,
        })
    }
}
