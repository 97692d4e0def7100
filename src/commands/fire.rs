//! `pkghooks fire`: dispatch one lifecycle hook for a package.

use std::path::PathBuf;

use clap::Args;

use crate::output;
use pkghooks_core::Package;
use pkghooks_core::config::AppConfig;
use pkghooks_core::AppResult;
use pkghooks_hooks::{HookName, HookRunner};

/// Arguments for the fire command
#[derive(Debug, Args)]
pub struct FireArgs {
    /// Lifecycle hook: pre_install, post_install, pre_uninstall, post_uninstall
    pub hook: HookName,

    /// Package name
    #[arg(long)]
    pub name: String,

    /// Package version
    #[arg(long)]
    pub version: Option<String>,

    /// Installation prefix
    #[arg(long)]
    pub prefix: PathBuf,

    /// Full spec string
    #[arg(long)]
    pub spec: Option<String>,

    /// Extra package metadata as key=value (value parsed as JSON when possible)
    #[arg(long = "set", value_parser = parse_key_value)]
    pub metadata: Vec<(String, serde_json::Value)>,
}

impl FireArgs {
    fn package(&self) -> Package {
        let mut package = Package::new(&self.name, &self.prefix);
        if let Some(version) = &self.version {
            package = package.with_version(version);
        }
        if let Some(spec) = &self.spec {
            package = package.with_spec(spec);
        }
        for (key, value) in &self.metadata {
            package = package.with_metadata(key, value.clone());
        }
        package
    }
}

/// Parse `key=value` into a metadata entry
fn parse_key_value(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Execute the fire command
pub async fn execute(args: &FireArgs, config: &AppConfig) -> AppResult<()> {
    let loader = super::hook_loader(config);
    let package = args.package();

    let invoked = HookRunner::new(args.hook).run(&loader, &package).await?;

    output::print_success(&format!(
        "Ran {} '{}' hook(s) for {}",
        invoked, args.hook, package
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("shared=true").expect("parse"),
            ("shared".to_string(), serde_json::json!(true))
        );
        assert_eq!(
            parse_key_value("compiler=gcc@13").expect("parse"),
            ("compiler".to_string(), serde_json::json!("gcc@13"))
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }
}
