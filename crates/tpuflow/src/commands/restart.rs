use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, name: Option<&str>) -> anyhow::Result<()> {
    match name {
        Some(name) => println!("{}", format!("Restarting {}", name).green().bold()),
        None => {
            let count = ctx.store.load().await?.len();
            println!(
                "{}",
                format!("{} TPU VM(s) recorded, resuming the first available one", count)
                    .green()
                    .bold()
            );
        }
    }

    ctx.orchestrator().restart(name).await?;
    Ok(())
}
