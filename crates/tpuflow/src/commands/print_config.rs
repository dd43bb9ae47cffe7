use crate::context::Context;
use colored::Colorize;
use tpuflow_cloud::TpuProvider;

pub async fn handle(ctx: &Context) -> anyhow::Result<()> {
    match ctx.config_source {
        Some(ref path) => println!("{} {}", "Config file:".bold(), path.display()),
        None => println!("{} {}", "Config file:".bold(), "none (defaults)".dimmed()),
    }
    println!("{}", serde_json::to_string_pretty(&ctx.config)?);
    println!();

    println!("{} {}", "Record table:".bold(), ctx.store.path().display());
    println!("{} {}", "SSH config:".bold(), ctx.trust.ssh_config().display());
    println!("{} {}", "known_hosts:".bold(), ctx.trust.known_hosts().display());

    match ctx.provider.gcloud().locate() {
        Ok(path) => {
            println!("{} {}", "gcloud:".bold(), path.display());
            let project = match ctx.provider.project().await {
                Ok(Some(project)) => project,
                Ok(None) => "not set".to_string(),
                Err(e) => {
                    tracing::debug!("Could not read the gcloud project: {}", e);
                    "unknown".to_string()
                }
            };
            println!("{} {}", "Project:".bold(), project);
        }
        Err(e) => println!("{} {}", "gcloud:".bold(), e.to_string().yellow()),
    }
    Ok(())
}
