//! `pkghooks list`: show discovered modules and the hooks they define.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use pkghooks_core::config::AppConfig;
use pkghooks_core::AppResult;
use pkghooks_hooks::{HookModule, HookName, ModuleAttr};

/// One row per hook module
#[derive(Debug, Serialize, Tabled)]
pub struct ModuleRow {
    /// Module name
    #[tabled(rename = "Module")]
    pub module: String,
    /// Module kind
    #[tabled(rename = "Kind")]
    pub kind: String,
    /// `pre_install` status
    #[tabled(rename = "pre_install")]
    pub pre_install: String,
    /// `post_install` status
    #[tabled(rename = "post_install")]
    pub post_install: String,
    /// `pre_uninstall` status
    #[tabled(rename = "pre_uninstall")]
    pub pre_uninstall: String,
    /// `post_uninstall` status
    #[tabled(rename = "post_uninstall")]
    pub post_uninstall: String,
    /// Source file
    #[tabled(rename = "Source")]
    pub source: String,
}

impl ModuleRow {
    fn from_module(module: &dyn HookModule) -> Self {
        let status = |hook: HookName| match module.lookup(hook.as_str()) {
            Some(ModuleAttr::Callable(_)) => "yes".to_string(),
            Some(ModuleAttr::Value) => "not callable".to_string(),
            None => "-".to_string(),
        };

        Self {
            module: module.name().to_string(),
            kind: module.kind().to_string(),
            pre_install: status(HookName::PreInstall),
            post_install: status(HookName::PostInstall),
            pre_uninstall: status(HookName::PreUninstall),
            post_uninstall: status(HookName::PostUninstall),
            source: module
                .source()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Execute the list command
pub async fn execute(config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let loader = super::hook_loader(config);
    let modules = loader.modules().await?;

    let rows: Vec<ModuleRow> = modules
        .iter()
        .map(|module| ModuleRow::from_module(&**module))
        .collect();

    output::print_list(&rows, format)
}
