use crate::actions;
use crate::engine::{Engine, OutputHandler};
use crate::CoreError;
use outpost_runtime::BackendError;
use outpost_schema::{SchemaError, DEFAULT_CLUSTER_NAME};
use tracing::info;

#[derive(Debug, Clone)]
pub struct UninstallInput {
    pub cluster_name: String,
    pub success_message: String,
    pub already_uninstalled_message: String,
}

impl UninstallInput {
    pub fn new(
        success_message: impl Into<String>,
        already_uninstalled_message: impl Into<String>,
    ) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            success_message: success_message.into(),
            already_uninstalled_message: already_uninstalled_message.into(),
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }
}

impl Default for UninstallInput {
    fn default() -> Self {
        Self::new("Outpost uninstalled", "Outpost is already uninstalled")
    }
}

#[derive(Debug, Clone)]
pub struct UninstallContent {
    pub already_uninstalled: bool,
    pub success_message: String,
    pub already_uninstalled_message: String,
}

impl UninstallContent {
    /// The message matching the outcome.
    pub fn message(&self) -> &str {
        if self.already_uninstalled {
            &self.already_uninstalled_message
        } else {
            &self.success_message
        }
    }
}

impl Engine {
    /// Remove the cluster and the record storage. Refused while any
    /// environment is still recorded; a missing record is not an error.
    pub fn uninstall(
        &self,
        input: UninstallInput,
        handler: &mut dyn OutputHandler<UninstallContent>,
    ) -> Result<UninstallContent, CoreError> {
        let result = self.run_uninstall(input);
        self.report(handler, result)
    }

    fn run_uninstall(&self, input: UninstallInput) -> Result<UninstallContent, CoreError> {
        let stepper = self.stepper();
        info!("uninstalling");
        stepper.start_temporary_step("Uninstalling Outpost");

        let backend = self.build_backend()?;
        let mut config = match backend.lookup_config(stepper) {
            Ok(config) => config,
            Err(BackendError::NotInstalled) => {
                info!("nothing to uninstall");
                return Ok(UninstallContent {
                    already_uninstalled: true,
                    success_message: input.success_message,
                    already_uninstalled_message: input.already_uninstalled_message,
                });
            }
            Err(e) => return Err(e.into()),
        };

        // Storage may exist without a cluster if a previous init failed early.
        match config.get_cluster(&input.cluster_name) {
            Ok(mut cluster) => {
                let count = config.count_envs_in_cluster(&cluster.name)?;
                if count > 0 {
                    return Err(CoreError::ExistingEnvs {
                        cluster: cluster.name,
                        count,
                    });
                }
                actions::remove_cluster(stepper, backend.as_ref(), &mut config, &mut cluster)?;
            }
            Err(SchemaError::ClusterNotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        backend.remove_config_storage(stepper)?;

        Ok(UninstallContent {
            already_uninstalled: false,
            success_message: input.success_message,
            already_uninstalled_message: input.already_uninstalled_message,
        })
    }
}
