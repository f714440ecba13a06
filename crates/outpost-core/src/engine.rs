use crate::CoreError;
use outpost_runtime::{CloudService, CloudServiceBuilder, Stepper};
use outpost_schema::{Cluster, Config, Env};
use tracing::warn;

/// The single outcome of a workflow invocation, handed to its output handler.
pub struct Output<'a, C> {
    pub stepper: &'a dyn Stepper,
    pub result: Result<&'a C, &'a CoreError>,
}

/// Receives exactly one [`Output`] per workflow invocation, including on
/// early failure.
pub trait OutputHandler<C> {
    fn handle_output(&mut self, output: Output<'_, C>) -> Result<(), CoreError>;
}

impl<C, F> OutputHandler<C> for F
where
    F: FnMut(Output<'_, C>) -> Result<(), CoreError>,
{
    fn handle_output(&mut self, output: Output<'_, C>) -> Result<(), CoreError> {
        self(output)
    }
}

/// Central entry point for Outpost workflows.
///
/// Each workflow builds a fresh backend handle, loads the configuration
/// record, checks status preconditions, runs the action primitives, and
/// reports its outcome through the caller's [`OutputHandler`]. The error (if
/// any) is also returned so callers can branch on it.
pub struct Engine {
    builder: Box<dyn CloudServiceBuilder>,
    stepper: Box<dyn Stepper>,
}

/// A loaded record with the cluster and environment a workflow acts on.
pub(crate) struct Resolved {
    pub backend: Box<dyn CloudService>,
    pub config: Config,
    pub cluster: Cluster,
    pub env: Env,
}

impl Engine {
    pub fn new(builder: Box<dyn CloudServiceBuilder>, stepper: Box<dyn Stepper>) -> Self {
        Self { builder, stepper }
    }

    pub fn stepper(&self) -> &dyn Stepper {
        self.stepper.as_ref()
    }

    pub(crate) fn build_backend(&self) -> Result<Box<dyn CloudService>, CoreError> {
        Ok(self.builder.build()?)
    }

    /// Build the backend, load the record, and look up an existing
    /// environment in the given cluster.
    pub(crate) fn resolve_env(
        &self,
        cluster_name: &str,
        env_name: &str,
    ) -> Result<Resolved, CoreError> {
        let backend = self.build_backend()?;
        let config = backend.lookup_config(self.stepper())?;
        let cluster = config.get_cluster(cluster_name)?;
        let env = config.get_env(&cluster.name, env_name)?;
        Ok(Resolved {
            backend,
            config,
            cluster,
            env,
        })
    }

    /// Deliver the outcome to `handler` once and hand it back to the caller.
    ///
    /// On success a handler error becomes the result. On failure the
    /// workflow error is kept and a handler error is only logged.
    pub(crate) fn report<C>(
        &self,
        handler: &mut dyn OutputHandler<C>,
        result: Result<C, CoreError>,
    ) -> Result<C, CoreError> {
        match result {
            Ok(content) => {
                handler.handle_output(Output {
                    stepper: self.stepper(),
                    result: Ok(&content),
                })?;
                Ok(content)
            }
            Err(err) => {
                if let Err(handler_err) = handler.handle_output(Output {
                    stepper: self.stepper(),
                    result: Err(&err),
                }) {
                    warn!("output handler failed while reporting '{err}': {handler_err}");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outpost_runtime::{MockBackend, NoopStepper, SharedServiceBuilder};
    use std::sync::Arc;

    fn engine() -> Engine {
        Engine::new(
            Box::new(SharedServiceBuilder::new(Arc::new(MockBackend::new()))),
            Box::new(NoopStepper),
        )
    }

    #[test]
    fn report_success_calls_handler_once() {
        let engine = engine();
        let mut seen = Vec::new();
        let mut handler = |output: Output<'_, u32>| -> Result<(), CoreError> {
            seen.push(output.result.copied().map_err(ToString::to_string));
            Ok(())
        };
        assert_eq!(engine.report(&mut handler, Ok(7)).unwrap(), 7);
        assert_eq!(seen, vec![Ok(7)]);
    }

    #[test]
    fn report_success_returns_handler_error() {
        let engine = engine();
        let mut handler =
            |_: Output<'_, u32>| -> Result<(), CoreError> { Err(CoreError::NotInstalled) };
        assert!(matches!(
            engine.report(&mut handler, Ok(1)),
            Err(CoreError::NotInstalled)
        ));
    }

    #[test]
    fn report_failure_keeps_workflow_error() {
        let engine = engine();
        let mut calls = 0;
        let mut handler = |output: Output<'_, u32>| -> Result<(), CoreError> {
            calls += 1;
            assert!(output.result.is_err());
            Err(CoreError::NotInstalled)
        };
        let err = engine
            .report(
                &mut handler,
                Err(CoreError::ExistingEnvs {
                    cluster: "default".to_owned(),
                    count: 1,
                }),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ExistingEnvs { .. }));
        assert_eq!(calls, 1);
    }

    #[test]
    fn resolve_env_on_empty_backend_is_not_installed() {
        let engine = engine();
        assert!(matches!(
            engine.resolve_env("default", "octo/hello"),
            Err(CoreError::NotInstalled)
        ));
    }
}
