pub mod close_port;
pub mod completions;
pub mod edit;
pub mod init;
pub mod list;
pub mod open_port;
pub mod remove;
pub mod uninstall;

use crate::settings::Settings;
use console::Style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use outpost_core::{
    BoxError, CoreError, Engine, Output, OutputHandler, RemoveConfirmation, StoreLock,
};
use outpost_runtime::{
    BackendError, CloudServiceBuilder, MockBackend, NamedBackendBuilder, NoopStepper,
    SharedServiceBuilder, Stepper,
};
use outpost_schema::{
    Env, EnvId, EnvStatus, GitUrl, ResolvedRepository, SchemaError, SshHostKey,
};
use outpost_store::StoreLayout;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::{stderr, stdin, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_STORE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub root: PathBuf,
    pub backend: String,
    pub cluster: String,
    pub settings: Settings,
    pub json: bool,
}

impl Context {
    pub fn engine(&self) -> Engine {
        let stepper: Box<dyn Stepper> = if self.json {
            Box::new(NoopStepper)
        } else {
            Box::new(SpinnerStepper::default())
        };
        Engine::new(self.builder(), stepper)
    }

    /// The mock backend keeps its state in memory, so one instance is shared
    /// for the lifetime of the process.
    pub fn builder(&self) -> Box<dyn CloudServiceBuilder> {
        if self.backend == "mock" {
            Box::new(SharedServiceBuilder::new(Arc::new(MockBackend::new())))
        } else {
            Box::new(NamedBackendBuilder::new(self.backend.clone(), self.root.clone()))
        }
    }

    pub fn lock(&self) -> Result<StoreLock, String> {
        StoreLock::acquire(&StoreLayout::new(&self.root)).map_err(|e| format!("store lock: {e}"))
    }

    pub fn repository(&self, reference: &str) -> Result<ResolvedRepository, String> {
        let default_owner = self.settings.default_owner.as_deref().unwrap_or_default();
        let repository = ResolvedRepository::resolve(reference, default_owner)
            .map_err(|e| format!("invalid input: {e}"))?;
        if repository.owner.is_empty() {
            return Err(format!(
                "invalid input: '{reference}' has no owner; use owner/name or set default_owner"
            ));
        }
        Ok(repository)
    }

    pub fn presenter(&self) -> Presenter {
        Presenter { json: self.json }
    }
}

/// How a workflow's content is printed: `view` for `--json`, `render` for
/// text.
pub trait Render {
    type View: Serialize;

    fn view(&self) -> Self::View;
    fn render(&self) -> String;
}

/// The printable part of an environment. Key material stays in the record.
#[derive(Debug, Serialize)]
pub struct EnvView {
    pub id: EnvId,
    pub name: String,
    pub status: EnvStatus,
    pub instance_type: String,
    pub address: String,
    pub repository: GitUrl,
    pub ssh_host_keys: Vec<SshHostKey>,
    pub opened_ports: BTreeSet<u16>,
}

impl From<&Env> for EnvView {
    fn from(env: &Env) -> Self {
        Self {
            id: env.id.clone(),
            name: env.name.clone(),
            status: env.status,
            instance_type: env.instance_type.clone(),
            address: env.instance_public_ip_address.clone(),
            repository: env.resolved_repository.git_url.clone(),
            ssh_host_keys: env.ssh_host_keys.clone(),
            opened_ports: env.opened_ports.clone(),
        }
    }
}

/// Output handler shared by the commands: clears the progress line, then
/// prints the content as JSON or text. Errors are printed by `main`.
pub struct Presenter {
    json: bool,
}

impl<C: Render> OutputHandler<C> for Presenter {
    fn handle_output(&mut self, output: Output<'_, C>) -> Result<(), CoreError> {
        output.stepper.stop_current_step();
        let Ok(content) = output.result else {
            return Ok(());
        };
        if self.json {
            let text =
                serde_json::to_string_pretty(&content.view()).map_err(std::io::Error::from)?;
            println!("{text}");
        } else {
            println!("{}", content.render());
        }
        Ok(())
    }
}

/// Progress reporting through a single indicatif spinner on stderr.
#[derive(Default)]
pub struct SpinnerStepper {
    bar: RefCell<Option<ProgressBar>>,
}

impl Stepper for SpinnerStepper {
    fn start_temporary_step(&self, step: &str) {
        let mut bar = self.bar.borrow_mut();
        match bar.as_ref() {
            Some(pb) => pb.set_message(step.to_owned()),
            None => *bar = Some(spinner(step)),
        }
    }

    fn stop_current_step(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

impl Drop for SpinnerStepper {
    fn drop(&mut self) {
        self.stop_current_step();
    }
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn success_line(msg: &str) -> String {
    format!("{} {msg}", Style::new().green().apply_to("✓"))
}

pub fn colorize_status(status: EnvStatus) -> String {
    let text = status.to_string();
    match status {
        EnvStatus::Created => Style::new().green().apply_to(text).to_string(),
        EnvStatus::Creating => Style::new().yellow().apply_to(text).to_string(),
        EnvStatus::Removing => Style::new().dim().apply_to(text).to_string(),
    }
}

/// Asks on the terminal before an environment is removed.
pub struct PromptConfirmation;

impl RemoveConfirmation for PromptConfirmation {
    fn confirm(&mut self, env: &Env) -> Result<bool, BoxError> {
        if !(stdin().is_terminal() && stderr().is_terminal()) {
            return Err(format!(
                "refusing to remove '{}' without confirmation (pass --force)",
                env.name
            )
            .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove the environment for \"{}\"? Its data will be lost",
                env.name
            ))
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

/// Message for a workflow error, prefixed so `main` can pick the exit code.
pub fn describe(err: &CoreError) -> String {
    match err {
        CoreError::Schema(
            SchemaError::InvalidPort(_)
            | SchemaError::ReservedPort(_)
            | SchemaError::InvalidRepository(_),
        )
        | CoreError::Backend(BackendError::InvalidInstanceType(_)) => {
            format!("invalid input: {err}")
        }
        CoreError::Persistence(_) | CoreError::Backend(BackendError::Store(_)) => {
            format!("store error: {err}")
        }
        CoreError::NotInstalled => format!("{err} (run `outpost init <repository>` first)"),
        _ => err.to_string(),
    }
}

pub fn exit_code_for(msg: &str) -> u8 {
    if msg.starts_with("invalid input:") || msg.starts_with("settings error:") {
        EXIT_INPUT_ERROR
    } else if msg.starts_with("store error:") || msg.starts_with("store lock:") {
        EXIT_STORE_ERROR
    } else {
        EXIT_FAILURE
    }
}
