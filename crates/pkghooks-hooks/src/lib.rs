//! # pkghooks-hooks
//!
//! Lifecycle hook dispatch for pkghooks. Provides:
//!
//! - Discovery of hook modules in a hook directory
//! - Manifest modules that run external commands
//! - Shared-library modules loaded via `libloading` (feature `dynamic`)
//! - Builtin modules made of Rust closures
//! - A memoized loader and the four lifecycle dispatchers
//!
//! Modules are discovered once per loader. On every dispatch each module is
//! asked for an attribute named after the lifecycle event; callable
//! attributes are invoked with the package, everything else is skipped.

pub mod definitions;
pub mod discovery;
pub mod error;
pub mod global;
pub mod loader;
pub mod module;
pub mod runner;

pub use definitions::{HookInvocation, HookName};
pub use error::HookError;
pub use loader::HookLoader;
pub use module::{ClosureModule, HookCallable, HookModule, ManifestModule, ModuleAttr, ModuleKind};
pub use runner::{HookRunner, POST_INSTALL, POST_UNINSTALL, PRE_INSTALL, PRE_UNINSTALL};
