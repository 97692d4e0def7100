//! Shared-library hook modules loaded with `libloading`.
//!
//! A library defines a hook by exporting a C symbol named after it:
//!
//! ```c
//! int32_t post_install(const char *invocation_json);
//! ```
//!
//! Zero means success. The argument is the JSON-encoded [`HookInvocation`],
//! valid only for the duration of the call. A library may also export
//! `uint32_t pkghooks_abi_version(void)`; when present it must return
//! [`ABI_VERSION`].

use std::ffi::CString;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use libloading::Library;
use tracing::{debug, info};

use super::{HookCallable, HookModule, ModuleAttr, ModuleKind};
use crate::definitions::HookInvocation;
use crate::error::HookError;

/// Hook ABI version understood by this build.
pub const ABI_VERSION: u32 = 1;

/// Symbol a library may export to declare its ABI version.
pub const ABI_VERSION_SYMBOL: &str = "pkghooks_abi_version";

/// Signature of an exported hook.
pub type NativeHookFn = unsafe extern "C" fn(invocation_json: *const c_char) -> i32;

/// Signature of the optional ABI version export.
pub type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// A hook module backed by a native shared library.
pub struct SharedLibraryModule {
    /// Module name.
    name: String,
    /// Library path.
    path: PathBuf,
    /// The loaded library, shared with every hook resolved from it.
    library: Arc<Library>,
}

impl SharedLibraryModule {
    /// Opens a shared library as a hook module.
    ///
    /// # Safety
    /// Loading a library runs its initializers, and every exported symbol
    /// looked up by hook name is assumed to have the [`NativeHookFn`]
    /// signature. Only load trusted libraries.
    pub unsafe fn load(name: &str, path: &Path) -> Result<Self, HookError> {
        let library = unsafe { Library::new(path) }.map_err(|e| HookError::LibraryLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        {
            let version_fn = unsafe { library.get::<AbiVersionFn>(ABI_VERSION_SYMBOL.as_bytes()) };
            if let Ok(version_fn) = version_fn {
                check_abi_version(path, unsafe { version_fn() })?;
            }
        }

        info!(module = %name, path = %path.display(), "Shared library hook module loaded");

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            library: Arc::new(library),
        })
    }
}

fn check_abi_version(path: &Path, found: u32) -> Result<(), HookError> {
    if found != ABI_VERSION {
        return Err(HookError::AbiMismatch {
            path: path.to_path_buf(),
            found,
            expected: ABI_VERSION,
        });
    }
    Ok(())
}

impl std::fmt::Debug for SharedLibraryModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLibraryModule")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

impl HookModule for SharedLibraryModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::SharedLibrary
    }

    fn source(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn lookup(&self, attr: &str) -> Option<ModuleAttr> {
        // SAFETY: the signature is the documented hook ABI, accepted by the
        // caller of `SharedLibraryModule::load`.
        let symbol = match unsafe { self.library.get::<NativeHookFn>(attr.as_bytes()) } {
            Ok(symbol) => symbol,
            Err(e) => {
                debug!(module = %self.name, attr = %attr, error = %e, "Symbol not exported");
                return None;
            }
        };

        Some(ModuleAttr::Callable(Arc::new(NativeHook {
            module: self.name.clone(),
            hook: attr.to_string(),
            func: *symbol,
            library: self.library.clone(),
        })))
    }
}

/// A resolved native hook. Holds the library open while it exists.
///
/// Native code cannot be interrupted: a call that outlives its time limit
/// keeps its blocking thread until the function returns.
struct NativeHook {
    /// Owning module name.
    module: String,
    /// Symbol name.
    hook: String,
    /// Resolved function pointer.
    func: NativeHookFn,
    /// Keeps `func` valid.
    library: Arc<Library>,
}

impl std::fmt::Debug for NativeHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeHook")
            .field("module", &self.module)
            .field("hook", &self.hook)
            .finish()
    }
}

#[async_trait]
impl HookCallable for NativeHook {
    async fn call(&self, invocation: &HookInvocation) -> Result<(), HookError> {
        let json = serde_json::to_string(invocation)?;
        let payload = CString::new(json).map_err(|e| {
            HookError::failed(&self.module, &self.hook, format!("invalid invocation payload: {e}"))
        })?;

        let func = self.func;
        let library = self.library.clone();
        let module = self.module.clone();
        let hook = self.hook.clone();
        let code = tokio::task::spawn_blocking(move || {
            let _library = library;
            // SAFETY: `payload` outlives the call and `_library` keeps the
            // symbol mapped.
            let code = unsafe { func(payload.as_ptr()) };
            debug!(module = %module, hook = %hook, code, "Native hook returned");
            code
        })
        .await?;

        if code != 0 {
            return Err(HookError::HookFailed {
                module: self.module.clone(),
                hook: self.hook.clone(),
                code: Some(code),
                message: format!("native hook returned {code}"),
            });
        }

        Ok(())
    }
}
