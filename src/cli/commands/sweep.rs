//! Sweep command - remove expired sessions once

use crate::cache::SessionCache;
use crate::cli::args::{OutputFormat, SweepArgs};
use crate::cli::Context;
use crate::error::WebSessionResult;
use console::style;

/// Execute the sweep command
pub async fn execute(args: SweepArgs, ctx: &Context) -> WebSessionResult<()> {
    let cache = ctx.open_cache().await?;
    let report = cache.sweep().await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Plain => println!("{}", report.removed),
        OutputFormat::Table => {
            println!(
                "{} Swept {} ({})",
                style("✓").green(),
                style(cache.dir().display()).cyan(),
                cache.policy()
            );
            println!("  scanned: {}", report.scanned);
            println!("  removed: {}", report.removed);
            if report.skipped > 0 {
                println!(
                    "  skipped: {} {}",
                    report.skipped,
                    style("(unreadable, left in place)").dim()
                );
            }
            if report.abandoned_temp_files > 0 {
                println!("  abandoned temp files: {}", report.abandoned_temp_files);
            }
        }
    }

    Ok(())
}
