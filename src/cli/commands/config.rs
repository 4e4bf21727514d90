//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::Context;
use crate::config::{Config, ConfigManager};
use crate::error::WebSessionResult;
use console::style;

/// Execute the config command
pub async fn execute(args: ConfigArgs, ctx: &Context) -> WebSessionResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(&ctx.config)?,
        Some(ConfigAction::Path) => println!("{}", ctx.config_manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(&ctx.config_manager, force).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> WebSessionResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> WebSessionResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        println!(
            "{} Config already exists at {}",
            style("!").yellow(),
            path.display()
        );
        println!("  Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!(
        "{} Configuration initialized at {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}
