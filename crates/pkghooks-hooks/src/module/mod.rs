//! Hook modules: the units discovered in the hook directory.
//!
//! A module answers attribute lookups by name. Dispatch only cares whether
//! an attribute is absent, present but not callable, or callable.

pub mod closure;
#[cfg(feature = "dynamic")]
pub mod dynamic;
pub mod manifest;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::definitions::HookInvocation;
use crate::error::HookError;

pub use closure::ClosureModule;
#[cfg(feature = "dynamic")]
pub use dynamic::SharedLibraryModule;
pub use manifest::ManifestModule;

/// Where a module came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    /// Registered in code on the loader.
    Builtin,
    /// A TOML manifest describing command hooks.
    Manifest,
    /// A native shared library exporting hook symbols.
    SharedLibrary,
}

impl ModuleKind {
    /// Returns the string name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Builtin => "builtin",
            Self::Manifest => "manifest",
            Self::SharedLibrary => "shared-library",
        }
    }
}

impl std::fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Something that can be invoked for a lifecycle event.
#[async_trait]
pub trait HookCallable: Send + Sync + std::fmt::Debug {
    /// Runs the hook.
    async fn call(&self, invocation: &HookInvocation) -> Result<(), HookError>;

    /// Per-hook time limit. `None` means the loader default applies.
    ///
    /// On expiry the dispatch fails with [`HookError::Timeout`] and the
    /// `call` future is dropped. Command hooks kill their child process;
    /// native hooks cannot be interrupted and finish on their blocking
    /// thread.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Result of looking up an attribute on a module.
#[derive(Debug, Clone)]
pub enum ModuleAttr {
    /// The attribute exists and can be invoked.
    Callable(Arc<dyn HookCallable>),
    /// The attribute exists but is plain data.
    Value,
}

impl ModuleAttr {
    /// Whether the attribute can be invoked.
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Callable(_))
    }
}

/// A loaded hook module.
pub trait HookModule: Send + Sync + std::fmt::Debug {
    /// Module name (file stem or directory name for discovered modules).
    fn name(&self) -> &str;

    /// What kind of module this is.
    fn kind(&self) -> ModuleKind;

    /// File the module was loaded from, if any.
    fn source(&self) -> Option<&Path> {
        None
    }

    /// Looks up an attribute by name. `None` means the module does not
    /// define it.
    fn lookup(&self, attr: &str) -> Option<ModuleAttr>;
}
