//! Hook system configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hook discovery and dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Directory scanned for hook modules.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// Whether hook modules are discovered at all. A disabled hook system
    /// still runs builtin modules registered in code.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Default upper bound for a single hook invocation, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            enabled: true,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./hooks")
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}
