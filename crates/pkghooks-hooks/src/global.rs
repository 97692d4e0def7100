//! Process-wide dispatchers.
//!
//! Install one [`HookLoader`] at startup, then fire lifecycle events from
//! anywhere without threading the loader through call sites.

use std::sync::OnceLock;

use pkghooks_core::Package;

use crate::definitions::HookName;
use crate::error::HookError;
use crate::loader::HookLoader;
use crate::runner::{HookRunner, POST_INSTALL, POST_UNINSTALL, PRE_INSTALL, PRE_UNINSTALL};

static LOADER: OnceLock<HookLoader> = OnceLock::new();

/// Installs the process-wide loader. Fails if one is already installed.
pub fn install(loader: HookLoader) -> Result<(), HookError> {
    LOADER.set(loader).map_err(|_| HookError::AlreadyInstalled)
}

/// Returns the process-wide loader.
pub fn loader() -> Result<&'static HookLoader, HookError> {
    LOADER.get().ok_or(HookError::NotInstalled)
}

/// Whether a process-wide loader has been installed.
pub fn is_installed() -> bool {
    LOADER.get().is_some()
}

/// Fires `hook` through the process-wide loader.
pub async fn fire(hook: HookName, package: &Package) -> Result<usize, HookError> {
    HookRunner::new(hook).run(loader()?, package).await
}

/// Fires `pre_install` hooks through the process-wide loader.
pub async fn pre_install(package: &Package) -> Result<usize, HookError> {
    PRE_INSTALL.run(loader()?, package).await
}

/// Fires `post_install` hooks through the process-wide loader.
pub async fn post_install(package: &Package) -> Result<usize, HookError> {
    POST_INSTALL.run(loader()?, package).await
}

/// Fires `pre_uninstall` hooks through the process-wide loader.
pub async fn pre_uninstall(package: &Package) -> Result<usize, HookError> {
    PRE_UNINSTALL.run(loader()?, package).await
}

/// Fires `post_uninstall` hooks through the process-wide loader.
pub async fn post_uninstall(package: &Package) -> Result<usize, HookError> {
    POST_UNINSTALL.run(loader()?, package).await
}
