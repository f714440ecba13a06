use super::{
    describe, success_line, Context, EnvView, PromptConfirmation, Render, EXIT_SUCCESS,
};
use outpost_core::{RemoveContent, RemoveInput};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RemoveView {
    pub cluster: String,
    pub env: EnvView,
    pub confirmed: bool,
}

impl Render for RemoveContent {
    type View = RemoveView;

    fn view(&self) -> RemoveView {
        RemoveView {
            cluster: self.cluster.name.clone(),
            env: EnvView::from(&self.env),
            confirmed: self.confirmed,
        }
    }

    fn render(&self) -> String {
        if self.confirmed {
            success_line(&format!("Environment \"{}\" removed", self.env.name))
        } else {
            format!("Removal of \"{}\" cancelled", self.env.name)
        }
    }
}

pub fn run(ctx: &Context, repository: &str, force: bool) -> Result<u8, String> {
    let repository = ctx.repository(repository)?;
    let _lock = ctx.lock()?;

    let input = RemoveInput::new(repository)
        .in_cluster(&ctx.cluster)
        .force(force)
        .with_confirmation(PromptConfirmation);
    ctx.engine()
        .remove(input, &mut ctx.presenter())
        .map_err(|e| describe(&e))?;
    Ok(EXIT_SUCCESS)
}
