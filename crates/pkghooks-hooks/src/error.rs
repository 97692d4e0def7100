//! Error type for hook discovery, loading, and dispatch.

use std::path::PathBuf;
use std::time::Duration;

use pkghooks_core::error::AppError;
use thiserror::Error;

/// Errors raised while loading hook modules or running hooks.
#[derive(Debug, Error)]
pub enum HookError {
    /// The configured hook directory does not exist.
    #[error("Hook directory not found: {}", .path.display())]
    DirectoryNotFound {
        /// The missing directory.
        path: PathBuf,
    },

    /// A manifest file is not valid TOML.
    #[error("Failed to parse hook manifest '{}': {message}", .path.display())]
    ManifestParse {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A manifest declares a command hook that cannot be used.
    #[error("Invalid hook '{hook}' in module '{module}': {message}")]
    InvalidHook {
        /// Module name.
        module: String,
        /// Attribute name.
        hook: String,
        /// What is wrong with it.
        message: String,
    },

    /// A shared library could not be opened.
    #[error("Failed to load hook library '{}': {message}", .path.display())]
    LibraryLoad {
        /// Library path.
        path: PathBuf,
        /// Loader message.
        message: String,
    },

    /// A shared library was built against a different hook ABI.
    #[error("Hook library '{}' reports ABI version {found}, expected {expected}", .path.display())]
    AbiMismatch {
        /// Library path.
        path: PathBuf,
        /// Version reported by the library.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },

    /// Two entries in the hook directory resolve to the same module name.
    #[error("Hook module '{name}' is defined by both '{}' and '{}'", .first.display(), .second.display())]
    DuplicateModule {
        /// Module name.
        name: String,
        /// Entry that sorts first.
        first: PathBuf,
        /// Conflicting entry.
        second: PathBuf,
    },

    /// The lifecycle event name is not one of the known hooks.
    #[error("Unknown hook '{name}'")]
    UnknownHook {
        /// The rejected name.
        name: String,
    },

    /// A hook ran and reported failure.
    #[error("Hook '{hook}' in module '{module}' failed: {message}")]
    HookFailed {
        /// Module name.
        module: String,
        /// Hook name.
        hook: String,
        /// Exit or return code, if the hook produced one.
        code: Option<i32>,
        /// Failure description.
        message: String,
    },

    /// A hook did not finish within its time limit.
    #[error("Hook '{hook}' in module '{module}' timed out after {timeout:?}")]
    Timeout {
        /// Module name.
        module: String,
        /// Hook name.
        hook: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// `global::install` was called twice.
    #[error("Process-wide hook loader is already installed")]
    AlreadyInstalled,

    /// A process-wide dispatcher was used before `global::install`.
    #[error("Process-wide hook loader has not been installed")]
    NotInstalled,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl HookError {
    /// Builds a [`HookError::HookFailed`] without a code, for hooks written in Rust.
    pub fn failed(module: &str, hook: &str, message: impl Into<String>) -> Self {
        Self::HookFailed {
            module: module.to_string(),
            hook: hook.to_string(),
            code: None,
            message: message.into(),
        }
    }
}

impl From<HookError> for AppError {
    fn from(err: HookError) -> Self {
        match &err {
            HookError::DirectoryNotFound { .. } => AppError::not_found(err.to_string()),
            HookError::UnknownHook { .. } => AppError::validation(err.to_string()),
            HookError::Timeout { .. } => AppError::timeout(err.to_string()),
            HookError::AlreadyInstalled | HookError::NotInstalled | HookError::Join(_) => {
                AppError::internal(err.to_string())
            }
            _ => AppError::plugin(err.to_string()),
        }
    }
}
