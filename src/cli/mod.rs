//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::cache::FlatFileCache;
use crate::config::{Config, ConfigManager};
use crate::error::WebSessionResult;
use std::path::PathBuf;

/// Settings shared by every subcommand
pub struct Context {
    pub config: Config,
    pub config_manager: ConfigManager,
    pub cache_dir: PathBuf,
}

impl Context {
    /// Open the session cache described by this context
    pub async fn open_cache(&self) -> WebSessionResult<FlatFileCache> {
        FlatFileCache::open(&self.cache_dir, self.config.expiry_policy()).await
    }
}
