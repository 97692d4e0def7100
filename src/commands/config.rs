//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::output::{self, OutputFormat};
use pkghooks_core::config::AppConfig;
use pkghooks_core::AppResult;
use pkghooks_core::error::AppError;

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Validate configuration and the hook directory
    Validate,
    /// Generate a default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "pkghooks.toml")]
        output: String,
    },
}

/// Execute config commands
pub async fn execute(
    args: &ConfigArgs,
    config: &AppConfig,
    config_path: &str,
    format: OutputFormat,
) -> AppResult<()> {
    match &args.command {
        ConfigCommand::Show => {
            output::print_document(config, format)?;
        }
        ConfigCommand::Validate => {
            config.validate()?;
            let loader = super::hook_loader(config);
            let modules = loader.modules().await?;

            output::print_success(&format!("Configuration '{}' is valid", config_path));
            match loader.directory() {
                Some(dir) => output::print_kv("Hook directory", &dir.display().to_string()),
                None => output::print_kv("Hook directory", "(disabled)"),
            }
            output::print_kv("Hook modules", &modules.len().to_string());
            output::print_kv(
                "Timeout",
                &format!("{}s", config.hooks.timeout_seconds),
            );
        }
        ConfigCommand::Generate { output: out_path } => {
            let default_config = include_str!("../../config/default.toml");

            if let Some(parent) = std::path::Path::new(out_path).parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| AppError::internal(format!("Failed to create dir: {}", e)))?;
                }
            }

            tokio::fs::write(out_path, default_config)
                .await
                .map_err(|e| AppError::internal(format!("Failed to write config: {}", e)))?;

            output::print_success(&format!("Default config written to '{}'", out_path));
        }
    }

    Ok(())
}
