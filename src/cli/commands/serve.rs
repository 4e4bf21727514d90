//! Serve command - run the reaper until shutdown

use crate::cache::SessionCache;
use crate::cli::Context;
use crate::error::{WebSessionError, WebSessionResult};
use crate::reaper::Reaper;
use console::style;
use std::sync::Arc;
use tracing::info;

/// Execute the serve command
pub async fn execute(ctx: &Context) -> WebSessionResult<()> {
    let cache: Arc<dyn SessionCache> = Arc::new(ctx.open_cache().await?);
    let cleanup = &ctx.config.cleanup;

    let mut reaper =
        Reaper::new(cache, cleanup.interval()).with_initial_delay(cleanup.initial_delay());
    reaper.start()?;

    println!(
        "{} Sweeping {} every {}h ({})",
        style("✓").green(),
        style(ctx.cache_dir.display()).cyan(),
        cleanup.interval_hours,
        ctx.config.expiry_policy()
    );

    shutdown_signal().await?;
    info!("Shutdown requested");
    reaper.stop().await;

    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> WebSessionResult<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())
        .map_err(|e| WebSessionError::io("installing SIGTERM handler", e))?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(|e| WebSessionError::io("waiting for Ctrl-C", e))
        }
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> WebSessionResult<()> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| WebSessionError::io("waiting for Ctrl-C", e))
}
