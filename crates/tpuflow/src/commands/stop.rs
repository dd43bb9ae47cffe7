use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, name: Option<&str>) -> anyhow::Result<()> {
    match name {
        Some(name) => println!("{}", format!("Stopping {}", name).green().bold()),
        None => println!(
            "{}",
            "Stopping the first recorded TPU VM that is running".green().bold()
        ),
    }

    ctx.orchestrator().stop(name).await?;
    Ok(())
}
