//! Log-out command - invalidate sessions of some or all users
//!
//! Resolving names or emails to account ids is the account system's job;
//! this command takes ids and raw session keys.

use crate::cache::SessionCache;
use crate::cli::args::LogOutArgs;
use crate::cli::Context;
use crate::error::WebSessionResult;
use crate::session::AccountId;
use console::style;

/// Execute the log-out command
pub async fn execute(args: LogOutArgs, ctx: &Context) -> WebSessionResult<()> {
    let cache = ctx.open_cache().await?;

    if args.all {
        let before = cache.size().await;
        cache.invalidate_all().await;
        println!(
            "{} Logged out all users ({} session(s) cleared)",
            style("✓").green(),
            before
        );
        return Ok(());
    }

    for id in args.account {
        let account = AccountId(id);
        let removed = cache.invalidate_account(account).await;
        println!(
            "{} Account {}: {} session(s) cleared",
            style("✓").green(),
            style(account).cyan(),
            removed
        );
    }

    if !args.key.is_empty() {
        cache.invalidate_keys(&args.key).await;
        println!(
            "{} {} session key(s) invalidated",
            style("✓").green(),
            args.key.len()
        );
    }

    Ok(())
}
