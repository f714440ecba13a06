use super::{describe, json_pretty, success_line, Context, EXIT_SUCCESS};
use outpost_core::{CoreError, InitHandle, InitInput, Output, SSH_PORT};
use outpost_schema::{EnvId, SshHostKey, ENV_ROOT_USER};
use serde::Serialize;
use std::collections::BTreeSet;

/// What `outpost init` reports once the environment is ready.
#[derive(Debug, Serialize)]
pub struct InitSummary {
    pub cluster: String,
    pub env: String,
    pub env_id: EnvId,
    pub created: bool,
    pub instance_type: String,
    pub address: String,
    pub ssh_user: String,
    pub ssh_port: String,
    pub ssh_host_keys: Vec<SshHostKey>,
    pub opened_ports: BTreeSet<u16>,
}

impl InitSummary {
    fn from_handle(handle: &InitHandle) -> Self {
        Self {
            cluster: handle.cluster.name.clone(),
            env: handle.env.name.clone(),
            env_id: handle.env.id.clone(),
            created: handle.env_created,
            instance_type: handle.env.instance_type.clone(),
            address: handle.env.instance_public_ip_address.clone(),
            ssh_user: ENV_ROOT_USER.to_owned(),
            ssh_port: SSH_PORT.to_owned(),
            ssh_host_keys: handle.env.ssh_host_keys.clone(),
            opened_ports: handle.env.opened_ports.clone(),
        }
    }

    fn render(&self) -> String {
        let headline = if self.created {
            format!("Environment \"{}\" created", self.env)
        } else {
            format!("Environment \"{}\" already exists", self.env)
        };
        let mut out = success_line(&headline);
        out.push_str(&format!(
            "\n  ssh {}@{} -p {}",
            self.ssh_user, self.address, self.ssh_port
        ));
        for key in &self.ssh_host_keys {
            out.push_str(&format!("\n  host key: {} {}", key.algorithm, key.fingerprint));
        }
        if !self.opened_ports.is_empty() {
            let ports: Vec<String> = self.opened_ports.iter().map(u16::to_string).collect();
            out.push_str(&format!("\n  open ports: {}", ports.join(", ")));
        }
        out
    }
}

pub fn run(ctx: &Context, repository: &str, instance_type: Option<&str>) -> Result<u8, String> {
    let repository = ctx.repository(repository)?;
    let instance_type = instance_type.unwrap_or_else(|| ctx.settings.instance_type());
    let _lock = ctx.lock()?;

    let engine = ctx.engine();
    let input = InitInput::new(repository, instance_type).in_cluster(&ctx.cluster);
    let mut handler = |output: Output<'_, InitHandle>| -> Result<(), CoreError> {
        output.stepper.stop_current_step();
        Ok(())
    };
    let mut handle = engine
        .begin_init(input, &mut handler)
        .map_err(|e| describe(&e))?;

    let completed = engine.complete_init(&mut handle);
    engine.stepper().stop_current_step();
    completed.map_err(|e| describe(&e))?;

    let summary = InitSummary::from_handle(&handle);
    if ctx.json {
        println!("{}", json_pretty(&summary)?);
    } else {
        println!("{}", summary.render());
    }
    Ok(EXIT_SUCCESS)
}
