use super::{describe, success_line, Context, Render, EXIT_SUCCESS};
use outpost_core::{UninstallContent, UninstallInput};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct UninstallView {
    pub already_uninstalled: bool,
    pub message: String,
}

impl Render for UninstallContent {
    type View = UninstallView;

    fn view(&self) -> UninstallView {
        UninstallView {
            already_uninstalled: self.already_uninstalled,
            message: self.message().to_owned(),
        }
    }

    fn render(&self) -> String {
        if self.already_uninstalled {
            self.message().to_owned()
        } else {
            success_line(self.message())
        }
    }
}

pub fn run(ctx: &Context) -> Result<u8, String> {
    let _lock = ctx.lock()?;

    let input = UninstallInput::default().in_cluster(&ctx.cluster);
    ctx.engine()
        .uninstall(input, &mut ctx.presenter())
        .map_err(|e| describe(&e))?;
    Ok(EXIT_SUCCESS)
}
