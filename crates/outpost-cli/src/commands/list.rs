use super::{colorize_status, json_pretty, Context, EXIT_SUCCESS};
use outpost_runtime::{BackendError, NoopStepper};
use outpost_schema::{Config, EnvStatus};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
pub struct ListEntry {
    pub cluster: String,
    pub name: String,
    pub status: EnvStatus,
    pub instance_type: String,
    pub address: String,
    pub opened_ports: BTreeSet<u16>,
}

pub fn entries(config: &Config) -> Vec<ListEntry> {
    config
        .envs()
        .map(|(cluster, env)| ListEntry {
            cluster: cluster.to_owned(),
            name: env.name.clone(),
            status: env.status,
            instance_type: env.instance_type.clone(),
            address: env.instance_public_ip_address.clone(),
            opened_ports: env.opened_ports.clone(),
        })
        .collect()
}

pub fn run(ctx: &Context) -> Result<u8, String> {
    let backend = ctx.builder().build().map_err(|e| e.to_string())?;
    let config = match backend.lookup_config(&NoopStepper) {
        Ok(config) => Some(config),
        Err(BackendError::NotInstalled) => None,
        Err(e) => return Err(format!("store error: {e}")),
    };
    let envs = config.as_ref().map(entries).unwrap_or_default();

    if ctx.json {
        println!("{}", json_pretty(&envs)?);
    } else if config.is_none() {
        println!("outpost is not installed");
    } else if envs.is_empty() {
        println!("no environments found");
    } else {
        println!(
            "{:<10} {:<28} {:<10} {:<8} {:<16} PORTS",
            "CLUSTER", "NAME", "STATUS", "TYPE", "ADDRESS"
        );
        for env in &envs {
            let ports: Vec<String> = env.opened_ports.iter().map(u16::to_string).collect();
            println!(
                "{:<10} {:<28} {:<10} {:<8} {:<16} {}",
                env.cluster,
                env.name,
                colorize_status(env.status),
                env.instance_type,
                env.address,
                ports.join(",")
            );
        }
    }
    Ok(EXIT_SUCCESS)
}
