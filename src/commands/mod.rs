//! CLI command definitions and dispatch.

pub mod config;
pub mod fire;
pub mod list;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use pkghooks_core::config::AppConfig;
use pkghooks_core::AppResult;
use pkghooks_hooks::HookLoader;

/// pkghooks: package lifecycle hook dispatcher
#[derive(Debug, Parser)]
#[command(name = "pkghooks", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "pkghooks.toml", env = "PKGHOOKS_CONFIG")]
    pub config: String,

    /// Hook directory (overrides `hooks.directory`)
    #[arg(long)]
    pub hooks_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List discovered hook modules and the hooks they define
    List,
    /// Fire one lifecycle hook for a package
    Fire(fire::FireArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Load configuration, applying command-line overrides
    pub fn load_config(&self) -> AppResult<AppConfig> {
        let mut config = AppConfig::load(&self.config)?;
        if let Some(dir) = &self.hooks_dir {
            config.hooks.directory = dir.clone();
            config.hooks.enabled = true;
        }
        Ok(config)
    }

    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> AppResult<()> {
        match &self.command {
            Commands::List => list::execute(&config, self.format).await,
            Commands::Fire(args) => fire::execute(args, &config).await,
            Commands::Config(args) => config::execute(args, &config, &self.config, self.format).await,
        }
    }
}

/// Helper: build the hook loader from configuration
pub fn hook_loader(config: &AppConfig) -> HookLoader {
    HookLoader::from_config(&config.hooks)
}
