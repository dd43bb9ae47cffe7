use crate::context::Context;
use colored::Colorize;

pub async fn handle(
    ctx: &Context,
    accelerator_type: &str,
    software_version: &str,
    zone: Option<&str>,
) -> anyhow::Result<()> {
    println!(
        "{}",
        format!("Creating a {} TPU VM ({})", accelerator_type, software_version)
            .green()
            .bold()
    );

    ctx.orchestrator()
        .create(accelerator_type, software_version, zone)
        .await?;
    Ok(())
}
