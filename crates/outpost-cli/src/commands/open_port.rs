use super::{describe, success_line, Context, EnvView, Render, EXIT_SUCCESS};
use outpost_core::{OpenPortContent, OpenPortInput};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct OpenPortView {
    pub cluster: String,
    pub env: EnvView,
    pub port: u16,
    pub already_opened: bool,
}

impl Render for OpenPortContent {
    type View = OpenPortView;

    fn view(&self) -> OpenPortView {
        OpenPortView {
            cluster: self.cluster.name.clone(),
            env: EnvView::from(&self.env),
            port: self.port,
            already_opened: self.already_opened,
        }
    }

    fn render(&self) -> String {
        if self.already_opened {
            format!("Port {} is already open on \"{}\"", self.port, self.env.name)
        } else {
            success_line(&format!(
                "Port {} opened on \"{}\" ({}:{})",
                self.port, self.env.name, self.env.instance_public_ip_address, self.port
            ))
        }
    }
}

pub fn run(ctx: &Context, repository: &str, port: &str) -> Result<u8, String> {
    let repository = ctx.repository(repository)?;
    let _lock = ctx.lock()?;

    let input = OpenPortInput::new(repository, port)
        .in_cluster(&ctx.cluster)
        .reserved_ports(ctx.settings.reserved_ports());
    ctx.engine()
        .open_port(input, &mut ctx.presenter())
        .map_err(|e| describe(&e))?;
    Ok(EXIT_SUCCESS)
}
