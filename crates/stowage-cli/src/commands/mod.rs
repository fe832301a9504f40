//! CLI command definitions and dispatch.

pub mod migrate;
pub mod user;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use stowage_core::config::AppConfig;
use stowage_database::Catalog;

use crate::output::OutputFormat;

/// Stowage: personal cloud storage administration
#[derive(Debug, Parser)]
#[command(name = "stowage", version, about, long_about = None)]
pub struct Cli {
    /// Explicit configuration file (overrides --env)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Environment overlay loaded from config/{env}.toml
    #[arg(short, long, env = "STOWAGE_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply catalog schema migrations
    Migrate,
    /// User management
    User(user::UserArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> anyhow::Result<()> {
        let config = self.load_config()?;
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
        }
    }

    fn load_config(&self) -> anyhow::Result<AppConfig> {
        let config = match &self.config {
            Some(path) => AppConfig::load_from(path),
            None => AppConfig::load(&self.env),
        };
        config.context("Failed to load configuration")
    }
}

/// Helper: open the configured catalog
pub async fn open_catalog(config: &AppConfig) -> anyhow::Result<Arc<dyn Catalog>> {
    stowage_database::open_catalog(&config.database)
        .await
        .context("Failed to open catalog")
}
