use crate::context::Context;
use colored::Colorize;

pub async fn handle(ctx: &Context, name: Option<&str>) -> anyhow::Result<()> {
    println!(
        "{}",
        format!(
            "Cleaning stale host keys in {}",
            ctx.trust.known_hosts().display()
        )
        .green()
        .bold()
    );

    let summary = ctx.orchestrator().cleanup_ssh_hosts(name).await?;

    if name.is_none() {
        if summary.pruned.is_empty() && summary.failed.is_empty() {
            println!("{}", "No TPU VM recorded".dimmed());
        } else {
            println!();
            println!(
                "{} checked, {} failed",
                summary.pruned.len() + summary.failed.len(),
                summary.failed.len()
            );
        }
    }
    Ok(())
}
