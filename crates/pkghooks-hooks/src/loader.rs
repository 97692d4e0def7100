//! Memoized hook module loader.
//!
//! The hook directory is scanned and every module loaded on first use. The
//! resulting list is cached for the lifetime of the loader and shared by all
//! dispatchers. A failed load is not cached.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pkghooks_core::config::hooks::HooksConfig;
use tokio::sync::OnceCell;
use tracing::info;

use crate::discovery::{self, DiscoveredModule, ModuleFormat};
use crate::error::HookError;
use crate::module::{HookModule, ManifestModule};

/// Time limit applied to a hook that does not declare its own.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Discovers, loads, and caches hook modules.
#[derive(Debug)]
pub struct HookLoader {
    /// Directory to scan; `None` runs builtin modules only.
    directory: Option<PathBuf>,
    /// Default per-hook time limit.
    timeout: Duration,
    /// Modules registered in code, listed before discovered ones.
    builtins: Vec<Arc<dyn HookModule>>,
    /// Loaded modules, computed at most once.
    modules: OnceCell<Vec<Arc<dyn HookModule>>>,
}

impl HookLoader {
    /// Creates a loader scanning `directory`.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: Some(directory.into()),
            timeout: DEFAULT_TIMEOUT,
            builtins: Vec::new(),
            modules: OnceCell::new(),
        }
    }

    /// Creates a loader that never touches the filesystem.
    pub fn builtin_only() -> Self {
        Self {
            directory: None,
            timeout: DEFAULT_TIMEOUT,
            builtins: Vec::new(),
            modules: OnceCell::new(),
        }
    }

    /// Creates a loader from configuration.
    pub fn from_config(config: &HooksConfig) -> Self {
        let loader = if config.enabled {
            Self::new(&config.directory)
        } else {
            Self::builtin_only()
        };
        loader.with_timeout(Duration::from_secs(config.timeout_seconds))
    }

    /// Sets the default per-hook time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Registers a module defined in code.
    pub fn with_builtin(mut self, module: Arc<dyn HookModule>) -> Self {
        self.builtins.push(module);
        self
    }

    /// The scanned directory, if any.
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Default per-hook time limit.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether modules have been loaded.
    pub fn is_loaded(&self) -> bool {
        self.modules.initialized()
    }

    /// Returns every hook module, loading them on the first call.
    pub async fn modules(&self) -> Result<&[Arc<dyn HookModule>], HookError> {
        let modules = self.modules.get_or_try_init(|| self.load_all()).await?;
        Ok(modules.as_slice())
    }

    async fn load_all(&self) -> Result<Vec<Arc<dyn HookModule>>, HookError> {
        let mut modules = self.builtins.clone();

        if let Some(directory) = &self.directory {
            for found in discovery::discover_modules(directory).await? {
                modules.push(load_module(found).await?);
            }
        }

        info!(
            directory = ?self.directory,
            count = modules.len(),
            "Hook modules loaded"
        );

        Ok(modules)
    }
}

async fn load_module(found: DiscoveredModule) -> Result<Arc<dyn HookModule>, HookError> {
    match found.format {
        ModuleFormat::Manifest => {
            let module = ManifestModule::load(&found.name, &found.path).await?;
            Ok(Arc::new(module))
        }
        #[cfg(feature = "dynamic")]
        ModuleFormat::SharedLibrary => {
            // SAFETY: libraries in the hook directory are trusted by the
            // operator who configured it.
            let module =
                unsafe { crate::module::SharedLibraryModule::load(&found.name, &found.path) }?;
            Ok(Arc::new(module))
        }
        #[cfg(not(feature = "dynamic"))]
        ModuleFormat::SharedLibrary => Err(HookError::LibraryLoad {
            path: found.path,
            message: "built without the `dynamic` feature".to_string(),
        }),
    }
}
