use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, name: &str) -> anyhow::Result<()> {
    println!("{}", format!("Deleting {}", name).green().bold());

    // Unknown names are reported by the orchestrator and are not an error
    ctx.orchestrator().delete(name).await?;
    Ok(())
}
