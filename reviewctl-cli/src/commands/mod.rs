//! Subcommands

pub mod migrate;
pub mod serve;

pub use migrate::run_migrate;
pub use serve::run_serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reviewctl_server::AppConfig;

/// Options shared by every command that needs configuration
#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    /// TOML config file ([server] and [database] tables)
    #[arg(long, short = 'c', env = "REVIEWCTL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Database URL (overrides config file and DB_* variables)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

impl ConfigArgs {
    /// Defaults, then config file, then environment, then flags.
    pub fn load(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => AppConfig::from_env().context("Invalid configuration in environment")?,
        };

        if let Some(url) = &self.database_url {
            config.database.url = Some(url.clone());
        }
        Ok(config)
    }
}
