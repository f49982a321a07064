//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use reviewctl_server::db::{create_pool, migrations};

use super::ConfigArgs;

/// Arguments for the migrate command
#[derive(Parser, Debug)]
pub struct MigrateArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Apply the schema and exit
pub async fn run_migrate(args: MigrateArgs) -> Result<()> {
    let config = args.config.load()?;

    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to apply schema")?;

    pool.close().await;
    Ok(())
}
