use crate::actions;
use crate::engine::{Engine, OutputHandler};
use crate::lifecycle::ensure_env_ready;
use crate::CoreError;
use outpost_schema::{
    build_env_name_from_repository, check_port_validity, Cluster, Env, ResolvedRepository,
    DEFAULT_CLUSTER_NAME,
};
use tracing::info;

/// Port the environment's SSH server listens on; never managed as a user port.
pub const SSH_PORT: &str = "2200";

#[derive(Debug, Clone)]
pub struct OpenPortInput {
    pub cluster_name: String,
    pub repository: ResolvedRepository,
    pub port: String,
    pub reserved_ports: Vec<String>,
}

impl OpenPortInput {
    pub fn new(repository: ResolvedRepository, port: impl Into<String>) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            repository,
            port: port.into(),
            reserved_ports: vec![SSH_PORT.to_owned()],
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    #[must_use]
    pub fn reserved_ports(mut self, reserved_ports: Vec<String>) -> Self {
        self.reserved_ports = reserved_ports;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OpenPortContent {
    pub cluster: Cluster,
    pub env: Env,
    pub port: u16,
    pub already_opened: bool,
}

#[derive(Debug, Clone)]
pub struct ClosePortInput {
    pub cluster_name: String,
    pub repository: ResolvedRepository,
    pub port: String,
    pub reserved_ports: Vec<String>,
}

impl ClosePortInput {
    pub fn new(repository: ResolvedRepository, port: impl Into<String>) -> Self {
        Self {
            cluster_name: DEFAULT_CLUSTER_NAME.to_owned(),
            repository,
            port: port.into(),
            reserved_ports: vec![SSH_PORT.to_owned()],
        }
    }

    #[must_use]
    pub fn in_cluster(mut self, cluster_name: impl Into<String>) -> Self {
        self.cluster_name = cluster_name.into();
        self
    }

    #[must_use]
    pub fn reserved_ports(mut self, reserved_ports: Vec<String>) -> Self {
        self.reserved_ports = reserved_ports;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClosePortContent {
    pub cluster: Cluster,
    pub env: Env,
    pub port: u16,
    pub already_closed: bool,
}

impl Engine {
    /// Open `input.port` on a `Created` environment. Opening a port that is
    /// already open makes no backend call.
    pub fn open_port(
        &self,
        input: OpenPortInput,
        handler: &mut dyn OutputHandler<OpenPortContent>,
    ) -> Result<OpenPortContent, CoreError> {
        let result = self.run_open_port(&input);
        self.report(handler, result)
    }

    /// Close `input.port` on a `Created` environment. Closing a port that is
    /// not open makes no backend call.
    pub fn close_port(
        &self,
        input: ClosePortInput,
        handler: &mut dyn OutputHandler<ClosePortContent>,
    ) -> Result<ClosePortContent, CoreError> {
        let result = self.run_close_port(&input);
        self.report(handler, result)
    }

    fn run_open_port(&self, input: &OpenPortInput) -> Result<OpenPortContent, CoreError> {
        let stepper = self.stepper();
        stepper.start_temporary_step(&format!("Opening port \"{}\"", input.port));
        let port = check_port_validity(&input.port, &input.reserved_ports)?;

        let env_name = build_env_name_from_repository(&input.repository);
        let mut resolved = self.resolve_env(&input.cluster_name, &env_name)?;
        ensure_env_ready("open a port on", &resolved.env)?;

        let already_opened = resolved.env.is_port_opened(port);
        if already_opened {
            info!("port {port} already open on {env_name}");
        } else {
            info!("opening port {port} on {env_name}");
            actions::open_port(
                stepper,
                resolved.backend.as_ref(),
                &mut resolved.config,
                &resolved.cluster,
                &mut resolved.env,
                port,
            )?;
        }

        Ok(OpenPortContent {
            cluster: resolved.cluster,
            env: resolved.env,
            port,
            already_opened,
        })
    }

    fn run_close_port(&self, input: &ClosePortInput) -> Result<ClosePortContent, CoreError> {
        let stepper = self.stepper();
        stepper.start_temporary_step(&format!("Closing port \"{}\"", input.port));
        let port = check_port_validity(&input.port, &input.reserved_ports)?;

        let env_name = build_env_name_from_repository(&input.repository);
        let mut resolved = self.resolve_env(&input.cluster_name, &env_name)?;
        ensure_env_ready("close a port on", &resolved.env)?;

        let already_closed = !resolved.env.is_port_opened(port);
        if already_closed {
            info!("port {port} already closed on {env_name}");
        } else {
            info!("closing port {port} on {env_name}");
            actions::close_port(
                stepper,
                resolved.backend.as_ref(),
                &mut resolved.config,
                &resolved.cluster,
                &mut resolved.env,
                port,
            )?;
        }

        Ok(ClosePortContent {
            cluster: resolved.cluster,
            env: resolved.env,
            port,
            already_closed,
        })
    }
}
