use anyhow::{Context, Result};

use crate::context::AppContext;

pub async fn health_check(ctx: &AppContext) -> Result<()> {
    // Check database
    ctx.store.health_check().await.context("Store unavailable")?;

    // Check broadcast substrate (Redis when configured)
    ctx.broadcaster
        .health_check()
        .await
        .context("Broadcaster unavailable")?;

    Ok(())
}
