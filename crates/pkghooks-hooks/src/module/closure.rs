//! Builtin modules assembled from Rust closures.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use super::{HookCallable, HookModule, ModuleAttr, ModuleKind};
use crate::definitions::{HookInvocation, HookName};
use crate::error::HookError;

type HookFuture = Pin<Box<dyn Future<Output = Result<(), HookError>> + Send>>;

/// A closure-backed hook.
struct ClosureHook {
    /// Handler function.
    handler: Arc<dyn Fn(&HookInvocation) -> HookFuture + Send + Sync>,
}

impl std::fmt::Debug for ClosureHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHook")
            .field("handler", &"<closure>")
            .finish()
    }
}

#[async_trait]
impl HookCallable for ClosureHook {
    async fn call(&self, invocation: &HookInvocation) -> Result<(), HookError> {
        (self.handler)(invocation).await
    }
}

/// A hook module defined in code.
///
/// # Example
/// ```rust,ignore
/// let module = ClosureModule::new("audit").hook(HookName::PostInstall, |inv| {
///     let name = inv.package.name.clone();
///     async move {
///         tracing::info!(package = %name, "installed");
///         Ok(())
///     }
/// });
/// ```
#[derive(Debug)]
pub struct ClosureModule {
    /// Module name.
    name: String,
    /// Attribute name → attribute.
    attributes: HashMap<String, ModuleAttr>,
}

impl ClosureModule {
    /// Creates a module with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: HashMap::new(),
        }
    }

    /// Defines a callable hook for a lifecycle event, replacing any
    /// previous attribute of the same name.
    pub fn hook<F, Fut>(mut self, hook: HookName, handler: F) -> Self
    where
        F: Fn(&HookInvocation) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        let callable = ClosureHook {
            handler: Arc::new(move |invocation: &HookInvocation| -> HookFuture {
                Box::pin(handler(invocation))
            }),
        };
        self.attributes.insert(
            hook.as_str().to_string(),
            ModuleAttr::Callable(Arc::new(callable)),
        );
        self
    }

    /// Defines a non-callable attribute.
    pub fn attribute(mut self, name: &str) -> Self {
        self.attributes.insert(name.to_string(), ModuleAttr::Value);
        self
    }

    /// Wraps the module for registration on a loader.
    pub fn into_module(self) -> Arc<dyn HookModule> {
        Arc::new(self)
    }
}

impl HookModule for ClosureModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Builtin
    }

    fn lookup(&self, attr: &str) -> Option<ModuleAttr> {
        self.attributes.get(attr).cloned()
    }
}
