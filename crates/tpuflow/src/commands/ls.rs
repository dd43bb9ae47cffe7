use crate::context::Context;
use crate::output;

pub async fn handle(ctx: &Context, details: bool) -> anyhow::Result<()> {
    let rows = ctx.orchestrator().list(details).await?;
    println!("{}", output::format_records(&rows, details));
    Ok(())
}
