use super::{colorize_status, describe, Context, EnvView, Render, EXIT_SUCCESS};
use outpost_core::{EditContent, EditInput, SSH_PORT};
use outpost_schema::ENV_ROOT_USER;
use serde::Serialize;

/// Connection details for an editor attaching to the environment.
#[derive(Debug, Serialize)]
pub struct EditView {
    pub cluster: String,
    pub env: EnvView,
    pub ssh_user: &'static str,
    pub ssh_port: &'static str,
}

impl Render for EditContent {
    type View = EditView;

    fn view(&self) -> EditView {
        EditView {
            cluster: self.cluster.name.clone(),
            env: EnvView::from(&self.env),
            ssh_user: ENV_ROOT_USER,
            ssh_port: SSH_PORT,
        }
    }

    fn render(&self) -> String {
        let env = &self.env;
        let mut out = format!(
            "{} ({})\n  ssh {ENV_ROOT_USER}@{} -p {SSH_PORT}\n  repository: {}",
            env.name,
            colorize_status(env.status),
            env.instance_public_ip_address,
            env.resolved_repository.git_url,
        );
        if !env.opened_ports.is_empty() {
            let ports: Vec<String> = env.opened_ports.iter().map(u16::to_string).collect();
            out.push_str(&format!("\n  open ports: {}", ports.join(", ")));
        }
        out
    }
}

pub fn run(ctx: &Context, repository: &str) -> Result<u8, String> {
    let repository = ctx.repository(repository)?;
    let _lock = ctx.lock()?;

    let input = EditInput::new(repository).in_cluster(&ctx.cluster);
    ctx.engine()
        .edit(input, &mut ctx.presenter())
        .map_err(|e| describe(&e))?;
    Ok(EXIT_SUCCESS)
}
