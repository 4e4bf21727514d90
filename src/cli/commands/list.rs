//! List command - show stored sessions

use crate::cache::SessionCache;
use crate::cli::args::{ListArgs, OutputFormat};
use crate::cli::Context;
use crate::error::WebSessionResult;
use crate::session::SessionVal;
use chrono::Utc;
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct ListedSession<'a> {
    key: &'a str,
    #[serde(flatten)]
    session: &'a SessionVal,
}

/// Execute the list command
pub async fn execute(args: ListArgs, ctx: &Context) -> WebSessionResult<()> {
    let cache = ctx.open_cache().await?;
    let mut sessions: Vec<(String, SessionVal)> = cache.snapshot().await.into_iter().collect();

    // Newest first
    sessions.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));

    match args.format {
        OutputFormat::Table if sessions.is_empty() => println!("No sessions"),
        OutputFormat::Table => print_table(&sessions),
        OutputFormat::Json => print_json(&sessions)?,
        OutputFormat::Plain => print_plain(&sessions),
    }

    Ok(())
}

fn print_table(sessions: &[(String, SessionVal)]) {
    let now = Utc::now();

    println!(
        "{:<36} {:<10} {:<17} {:<17}",
        style("KEY").bold(),
        style("ACCOUNT").bold(),
        style("CREATED").bold(),
        style("EXPIRES").bold()
    );
    println!("{}", "-".repeat(83));

    for (key, session) in sessions {
        let expires = session.expires_at.format("%Y-%m-%d %H:%M").to_string();
        let expires_styled = if session.is_expired(now) {
            style(expires).red()
        } else {
            style(expires).green()
        };

        println!(
            "{:<36} {:<10} {:<17} {:<17}",
            key,
            session.account_id,
            session.created_at.format("%Y-%m-%d %H:%M"),
            expires_styled
        );
    }

    println!();
    println!("{} session(s)", sessions.len());
}

fn print_json(sessions: &[(String, SessionVal)]) -> WebSessionResult<()> {
    let listed: Vec<ListedSession<'_>> = sessions
        .iter()
        .map(|(key, session)| ListedSession { key, session })
        .collect();
    println!("{}", serde_json::to_string_pretty(&listed)?);
    Ok(())
}

fn print_plain(sessions: &[(String, SessionVal)]) {
    for (key, _) in sessions {
        println!("{}", key);
    }
}
