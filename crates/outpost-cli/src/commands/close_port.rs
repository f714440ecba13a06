use super::{describe, success_line, Context, EnvView, Render, EXIT_SUCCESS};
use outpost_core::{ClosePortContent, ClosePortInput};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ClosePortView {
    pub cluster: String,
    pub env: EnvView,
    pub port: u16,
    pub already_closed: bool,
}

impl Render for ClosePortContent {
    type View = ClosePortView;

    fn view(&self) -> ClosePortView {
        ClosePortView {
            cluster: self.cluster.name.clone(),
            env: EnvView::from(&self.env),
            port: self.port,
            already_closed: self.already_closed,
        }
    }

    fn render(&self) -> String {
        if self.already_closed {
            format!("Port {} is not open on \"{}\"", self.port, self.env.name)
        } else {
            success_line(&format!("Port {} closed on \"{}\"", self.port, self.env.name))
        }
    }
}

pub fn run(ctx: &Context, repository: &str, port: &str) -> Result<u8, String> {
    let repository = ctx.repository(repository)?;
    let _lock = ctx.lock()?;

    let input = ClosePortInput::new(repository, port)
        .in_cluster(&ctx.cluster)
        .reserved_ports(ctx.settings.reserved_ports());
    ctx.engine()
        .close_port(input, &mut ctx.presenter())
        .map_err(|e| describe(&e))?;
    Ok(EXIT_SUCCESS)
}
