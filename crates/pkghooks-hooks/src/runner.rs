//! Lifecycle dispatchers.
//!
//! A [`HookRunner`] is bound to one lifecycle event. Running it walks the
//! loader's modules in order, invokes every callable attribute named after
//! the event, and stops at the first failure.

use chrono::Utc;
use pkghooks_core::Package;
use tracing::{debug, error, info};

use crate::definitions::{HookInvocation, HookName};
use crate::error::HookError;
use crate::loader::HookLoader;
use crate::module::ModuleAttr;

/// Fires `pre_install` hooks.
pub const PRE_INSTALL: HookRunner = HookRunner::new(HookName::PreInstall);
/// Fires `post_install` hooks.
pub const POST_INSTALL: HookRunner = HookRunner::new(HookName::PostInstall);
/// Fires `pre_uninstall` hooks.
pub const PRE_UNINSTALL: HookRunner = HookRunner::new(HookName::PreUninstall);
/// Fires `post_uninstall` hooks.
pub const POST_UNINSTALL: HookRunner = HookRunner::new(HookName::PostUninstall);

/// Dispatcher bound to a single lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookRunner {
    /// The event this runner fires.
    hook: HookName,
}

impl HookRunner {
    /// Creates a runner for `hook`.
    pub const fn new(hook: HookName) -> Self {
        Self { hook }
    }

    /// The event this runner fires.
    pub fn hook(&self) -> HookName {
        self.hook
    }

    /// Invokes the hook in every module that defines it as a callable.
    ///
    /// Returns the number of hooks invoked. Load errors, hook failures, and
    /// timeouts propagate immediately; later modules do not run.
    pub async fn run(&self, loader: &HookLoader, package: &Package) -> Result<usize, HookError> {
        let modules = loader.modules().await?;
        let attr = self.hook.as_str();
        let timestamp = Utc::now();
        let mut invoked = 0;

        for module in modules {
            let callable = match module.lookup(attr) {
                Some(ModuleAttr::Callable(callable)) => callable,
                Some(ModuleAttr::Value) => {
                    debug!(
                        hook = %self.hook,
                        module = %module.name(),
                        "Attribute is not callable, skipping"
                    );
                    continue;
                }
                None => continue,
            };

            let invocation = HookInvocation {
                hook: self.hook,
                module: module.name().to_string(),
                package: package.clone(),
                timestamp,
            };
            let limit = callable.timeout().unwrap_or_else(|| loader.timeout());

            debug!(
                hook = %self.hook,
                module = %module.name(),
                package = %package,
                "Invoking hook"
            );

            match tokio::time::timeout(limit, callable.call(&invocation)).await {
                Ok(Ok(())) => invoked += 1,
                Ok(Err(e)) => {
                    error!(
                        hook = %self.hook,
                        module = %module.name(),
                        error = %e,
                        "Hook failed"
                    );
                    return Err(e);
                }
                Err(_) => {
                    error!(
                        hook = %self.hook,
                        module = %module.name(),
                        timeout = ?limit,
                        "Hook timed out"
                    );
                    return Err(HookError::Timeout {
                        module: module.name().to_string(),
                        hook: attr.to_string(),
                        timeout: limit,
                    });
                }
            }
        }

        info!(
            hook = %self.hook,
            package = %package,
            invoked = invoked,
            "Hooks dispatched"
        );

        Ok(invoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::module::ClosureModule;

    fn counting_module(name: &str, hook: HookName, counter: Arc<AtomicU32>) -> ClosureModule {
        ClosureModule::new(name).hook(hook, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), HookError>(())
            }
        })
    }

    fn package() -> Package {
        Package::new("zlib", "/opt/zlib").with_version("1.3")
    }

    #[tokio::test]
    async fn test_modules_without_attribute_are_skipped() {
        let installs = Arc::new(AtomicU32::new(0));
        let uninstalls = Arc::new(AtomicU32::new(0));
        let loader = HookLoader::builtin_only()
            .with_builtin(counting_module("a", HookName::PostInstall, installs.clone()).into_module())
            .with_builtin(counting_module("b", HookName::PostUninstall, uninstalls.clone()).into_module())
            .with_builtin(ClosureModule::new("empty").into_module());

        let invoked = POST_INSTALL.run(&loader, &package()).await.expect("dispatch");
        assert_eq!(invoked, 1);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
        assert_eq!(uninstalls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_callable_attribute_is_skipped() {
        let loader = HookLoader::builtin_only()
            .with_builtin(ClosureModule::new("data").attribute("pre_install").into_module());

        let invoked = PRE_INSTALL.run(&loader, &package()).await.expect("dispatch");
        assert_eq!(invoked, 0);
    }

    #[tokio::test]
    async fn test_each_hook_runs_once_per_dispatch() {
        let counter = Arc::new(AtomicU32::new(0));
        let loader = HookLoader::builtin_only()
            .with_builtin(counting_module("a", HookName::PreInstall, counter.clone()).into_module())
            .with_builtin(counting_module("b", HookName::PreInstall, counter.clone()).into_module());

        PRE_INSTALL.run(&loader, &package()).await.expect("first dispatch");
        assert_eq!(counter.load(Ordering::SeqCst), 2);

        PRE_INSTALL.run(&loader, &package()).await.expect("second dispatch");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_invocation_carries_package_and_module() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let module = ClosureModule::new("recorder").hook(HookName::PreUninstall, move |inv| {
            if let Ok(mut seen) = sink.lock() {
                seen.push((inv.hook, inv.module.clone(), inv.package.to_string()));
            }
            async { Ok::<(), HookError>(()) }
        });
        let loader = HookLoader::builtin_only().with_builtin(module.into_module());

        PRE_UNINSTALL.run(&loader, &package()).await.expect("dispatch");

        let seen = seen.lock().expect("lock");
        assert_eq!(
            *seen,
            vec![(HookName::PreUninstall, "recorder".to_string(), "zlib@1.3".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failure_stops_dispatch() {
        let after = Arc::new(AtomicU32::new(0));
        let failing = ClosureModule::new("failing").hook(HookName::PostInstall, |inv| {
            let module = inv.module.clone();
            async move { Err::<(), HookError>(HookError::failed(&module, "post_install", "disk full")) }
        });
        let loader = HookLoader::builtin_only()
            .with_builtin(failing.into_module())
            .with_builtin(counting_module("after", HookName::PostInstall, after.clone()).into_module());

        let err = POST_INSTALL.run(&loader, &package()).await.expect_err("should fail");
        assert!(matches!(err, HookError::HookFailed { module, .. } if module == "failing"));
        assert_eq!(after.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_hook_times_out() {
        let slow = ClosureModule::new("slow").hook(HookName::PreInstall, |_| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<(), HookError>(())
        });
        let loader = HookLoader::builtin_only()
            .with_timeout(Duration::from_millis(50))
            .with_builtin(slow.into_module());

        let err = PRE_INSTALL.run(&loader, &package()).await.expect_err("timeout");
        assert!(
            matches!(err, HookError::Timeout { module, hook, .. } if module == "slow" && hook == "pre_install")
        );
    }

    #[tokio::test]
    async fn test_timed_out_hook_future_is_dropped() {
        struct DropFlag(Arc<AtomicU32>);
        impl Drop for DropFlag {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicU32::new(0));
        let flag = dropped.clone();
        let slow = ClosureModule::new("slow").hook(HookName::PostUninstall, move |_| {
            let guard = DropFlag(flag.clone());
            async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(guard);
                Ok::<(), HookError>(())
            }
        });
        let loader = HookLoader::builtin_only()
            .with_timeout(Duration::from_millis(20))
            .with_builtin(slow.into_module());

        let err = POST_UNINSTALL.run(&loader, &package()).await.expect_err("timeout");
        assert!(matches!(err, HookError::Timeout { .. }));
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_error_propagates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let loader = HookLoader::new(dir.path().join("missing"));

        let err = POST_UNINSTALL.run(&loader, &package()).await.expect_err("load error");
        assert!(matches!(err, HookError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_runner_constants_are_bound() {
        assert_eq!(PRE_INSTALL.hook(), HookName::PreInstall);
        assert_eq!(POST_INSTALL.hook(), HookName::PostInstall);
        assert_eq!(PRE_UNINSTALL.hook(), HookName::PreUninstall);
        assert_eq!(POST_UNINSTALL.hook(), HookName::PostUninstall);
    }
}
