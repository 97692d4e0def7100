//! Hook directory scanning.
//!
//! Only direct children of the hook directory are considered:
//!
//! - `<name>.toml` is a manifest module
//! - `<name>/hook.toml` is a manifest module named after the directory
//! - `<name>.so`, `<name>.dylib`, `<name>.dll` are shared-library modules
//!   (feature `dynamic`)
//!
//! Hidden entries and editor leftovers (`.#name`, `name~`) are skipped.
//! Two entries resolving to the same module name are an error.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::HookError;
use crate::module::ModuleKind;

/// Manifest file extension.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Manifest file name inside a module directory.
pub const PACKAGE_MANIFEST: &str = "hook.toml";

/// Shared library extensions recognized on every platform.
pub const LIBRARY_EXTENSIONS: &[&str] = &["so", "dylib", "dll"];

/// On-disk format of a discovered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// TOML manifest.
    Manifest,
    /// Native shared library.
    SharedLibrary,
}

impl From<ModuleFormat> for ModuleKind {
    fn from(format: ModuleFormat) -> Self {
        match format {
            ModuleFormat::Manifest => ModuleKind::Manifest,
            ModuleFormat::SharedLibrary => ModuleKind::SharedLibrary,
        }
    }
}

/// A module found in the hook directory, not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredModule {
    /// Module name.
    pub name: String,
    /// File to load.
    pub path: PathBuf,
    /// How to load it.
    pub format: ModuleFormat,
}

/// Lists the hook modules in `dir`, sorted by name. Names are unique.
pub async fn discover_modules(dir: &Path) -> Result<Vec<DiscoveredModule>, HookError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(HookError::DirectoryNotFound {
                path: dir.to_path_buf(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut modules = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
            debug!(path = %path.display(), "Skipping non UTF-8 entry");
            continue;
        };

        if is_ignored(&file_name) {
            continue;
        }

        // Follows symlinks so linked hook files behave like regular ones.
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable hook entry");
                continue;
            }
        };

        if metadata.is_dir() {
            let manifest = path.join(PACKAGE_MANIFEST);
            let has_manifest = tokio::fs::metadata(&manifest)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if has_manifest {
                modules.push(DiscoveredModule {
                    name: file_name,
                    path: manifest,
                    format: ModuleFormat::Manifest,
                });
            }
            continue;
        }

        if !metadata.is_file() {
            continue;
        }

        if let Some(found) = classify_file(&file_name, &path) {
            modules.push(found);
        }
    }

    modules.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));

    if let Some(pair) = modules.windows(2).find(|pair| pair[0].name == pair[1].name) {
        return Err(HookError::DuplicateModule {
            name: pair[0].name.clone(),
            first: pair[0].path.clone(),
            second: pair[1].path.clone(),
        });
    }

    debug!(
        directory = %dir.display(),
        count = modules.len(),
        "Hook modules discovered"
    );

    Ok(modules)
}

fn is_ignored(file_name: &str) -> bool {
    file_name.starts_with('.') || file_name.ends_with('~')
}

fn classify_file(file_name: &str, path: &Path) -> Option<DiscoveredModule> {
    let as_path = Path::new(file_name);
    let stem = as_path.file_stem()?.to_str()?;
    let extension = as_path.extension()?.to_str()?;

    let format = if extension == MANIFEST_EXTENSION {
        ModuleFormat::Manifest
    } else if LIBRARY_EXTENSIONS.contains(&extension) {
        if !cfg!(feature = "dynamic") {
            debug!(path = %path.display(), "Shared library hooks need the `dynamic` feature, skipping");
            return None;
        }
        ModuleFormat::SharedLibrary
    } else {
        return None;
    };

    Some(DiscoveredModule {
        name: stem.to_string(),
        path: path.to_path_buf(),
        format,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        std::fs::write(path, "").expect("write fixture");
    }

    #[tokio::test]
    async fn test_discovers_manifests_and_package_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("modulefiles.toml"));
        touch(&dir.path().join("audit.toml"));
        std::fs::create_dir(dir.path().join("licensing")).expect("mkdir");
        touch(&dir.path().join("licensing").join(PACKAGE_MANIFEST));

        let found = discover_modules(dir.path()).await.expect("discover");
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["audit", "licensing", "modulefiles"]);
        assert!(found.iter().all(|m| m.format == ModuleFormat::Manifest));
        assert_eq!(ModuleKind::from(found[0].format), ModuleKind::Manifest);
        assert_eq!(
            found[1].path,
            dir.path().join("licensing").join(PACKAGE_MANIFEST)
        );
    }

    #[tokio::test]
    async fn test_skips_editor_leftovers_and_unknown_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join(".#modulefiles.toml"));
        touch(&dir.path().join("modulefiles.toml~"));
        touch(&dir.path().join(".hidden.toml"));
        touch(&dir.path().join("README.md"));
        touch(&dir.path().join("notes"));
        std::fs::create_dir(dir.path().join("empty")).expect("mkdir");

        let found = discover_modules(dir.path()).await.expect("discover");
        assert!(found.is_empty(), "unexpected modules: {found:?}");
    }

    #[cfg(feature = "dynamic")]
    #[tokio::test]
    async fn test_discovers_shared_libraries() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("libsetup.so"));
        touch(&dir.path().join("cleanup.dll"));

        let found = discover_modules(dir.path()).await.expect("discover");
        let names: Vec<&str> = found.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["cleanup", "libsetup"]);
        assert!(found.iter().all(|m| m.format == ModuleFormat::SharedLibrary));
        assert_eq!(ModuleKind::from(found[0].format), ModuleKind::SharedLibrary);
    }

    #[tokio::test]
    async fn test_same_name_in_two_forms_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("audit.toml"));
        std::fs::create_dir(dir.path().join("audit")).expect("mkdir");
        touch(&dir.path().join("audit").join(PACKAGE_MANIFEST));
        touch(&dir.path().join("other.toml"));

        let err = discover_modules(dir.path()).await.expect_err("duplicate name");
        match err {
            HookError::DuplicateModule { name, first, second } => {
                assert_eq!(name, "audit");
                assert_eq!(first, dir.path().join("audit").join(PACKAGE_MANIFEST));
                assert_eq!(second, dir.path().join("audit.toml"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope");

        let err = discover_modules(&missing).await.expect_err("missing dir");
        assert!(matches!(err, HookError::DirectoryNotFound { path } if path == missing));
    }
}
