//! Status command - summarize the session cache

use crate::cache::SessionCache;
use crate::cli::Context;
use crate::error::WebSessionResult;
use console::style;

/// Execute the status command
pub async fn execute(ctx: &Context) -> WebSessionResult<()> {
    let cache = ctx.open_cache().await?;

    println!("{}", style("Web Session Cache").bold().cyan());
    println!();
    println!("  Directory: {}", cache.dir().display());
    println!("  Policy:    {}", cache.policy());
    println!("  Cleanup:   every {}h", ctx.config.cleanup.interval_hours);
    println!("  Entries:   {}", cache.size().await);
    println!("  Config:    {}", ctx.config_manager.path().display());

    Ok(())
}
