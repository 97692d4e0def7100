//! Lifecycle hook names and the invocation handed to every hook.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use pkghooks_core::Package;
use serde::{Deserialize, Serialize};

use crate::error::HookError;

/// The lifecycle points at which hooks are fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookName {
    /// Fired before a package is installed.
    PreInstall,
    /// Fired after a package is installed.
    PostInstall,
    /// Fired before a package is uninstalled.
    PreUninstall,
    /// Fired after a package is uninstalled.
    PostUninstall,
}

impl HookName {
    /// Every lifecycle hook, in lifecycle order.
    pub const ALL: [HookName; 4] = [
        Self::PreInstall,
        Self::PostInstall,
        Self::PreUninstall,
        Self::PostUninstall,
    ];

    /// The attribute name a module must define to receive this hook.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PreInstall => "pre_install",
            Self::PostInstall => "post_install",
            Self::PreUninstall => "pre_uninstall",
            Self::PostUninstall => "post_uninstall",
        }
    }
}

impl std::fmt::Display for HookName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for HookName {
    type Err = HookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|hook| hook.as_str() == s)
            .ok_or_else(|| HookError::UnknownHook {
                name: s.to_string(),
            })
    }
}

/// Everything a hook receives when it is invoked.
///
/// Out-of-process hooks get this serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookInvocation {
    /// The lifecycle event being fired.
    pub hook: HookName,
    /// Name of the module whose hook is running.
    pub module: String,
    /// The package the event is about.
    pub package: Package,
    /// When the dispatch started.
    pub timestamp: DateTime<Utc>,
}

impl HookInvocation {
    /// Creates an invocation stamped with the current time.
    pub fn new(hook: HookName, module: impl Into<String>, package: Package) -> Self {
        Self {
            hook,
            module: module.into(),
            package,
            timestamp: Utc::now(),
        }
    }
}
