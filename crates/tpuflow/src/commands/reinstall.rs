use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, name: &str) -> anyhow::Result<()> {
    println!("{}", format!("Reinstalling {}", name).green().bold());

    ctx.orchestrator().reinstall(name).await?;
    Ok(())
}
