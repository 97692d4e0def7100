//! Manifest modules: TOML files whose tables describe command hooks.
//!
//! Every top-level key is an attribute. A table with a `command` key is a
//! callable hook; any other value is plain data.
//!
//! ```toml
//! description = "Regenerate environment modules"
//!
//! [post_install]
//! command = "sh"
//! args = ["-c", "modulegen {name} {version} {prefix}"]
//! env = { MODULEPATH = "/opt/modules" }
//! timeout_seconds = 10
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{HookCallable, HookModule, ModuleAttr, ModuleKind};
use crate::definitions::HookInvocation;
use crate::error::HookError;

/// Maximum number of stderr characters kept in a failure message.
const STDERR_LIMIT: usize = 2000;

/// A command hook as declared in a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandHook {
    /// Program to run. Relative paths containing a separator are resolved
    /// against the manifest's directory.
    pub command: String,
    /// Arguments; `{hook}`, `{module}`, `{name}`, `{version}`, `{prefix}`
    /// and `{spec}` are substituted.
    #[serde(default)]
    pub args: Vec<String>,
    /// Extra environment variables.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Working directory; defaults to the manifest's directory.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    /// Overrides the loader's default time limit.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

/// A command hook bound to the module that declared it.
#[derive(Debug)]
struct CommandCallable {
    /// Owning module name.
    module: String,
    /// Attribute name.
    hook: String,
    /// Directory of the manifest.
    base_dir: PathBuf,
    /// Declared command.
    spec: CommandHook,
}

impl CommandCallable {
    fn program(&self) -> PathBuf {
        let command = Path::new(&self.spec.command);
        if command.is_relative() && command.components().count() > 1 {
            self.base_dir.join(command)
        } else {
            command.to_path_buf()
        }
    }

    fn working_dir(&self) -> PathBuf {
        match &self.spec.working_dir {
            Some(dir) if dir.is_relative() => self.base_dir.join(dir),
            Some(dir) => dir.clone(),
            None => self.base_dir.clone(),
        }
    }
}

#[async_trait]
impl HookCallable for CommandCallable {
    async fn call(&self, invocation: &HookInvocation) -> Result<(), HookError> {
        let program = self.program();
        let args = substitute_args(&self.spec.args, invocation);
        let payload = serde_json::to_vec(invocation)?;
        let package = &invocation.package;

        debug!(
            module = %self.module,
            hook = %self.hook,
            command = %program.display(),
            args = ?args,
            "Running command hook"
        );

        let mut cmd = Command::new(&program);
        cmd.args(&args)
            .current_dir(self.working_dir())
            .env("PKGHOOKS_HOOK", invocation.hook.as_str())
            .env("PKGHOOKS_MODULE", &invocation.module)
            .env("PKGHOOKS_PACKAGE_NAME", &package.name)
            .env("PKGHOOKS_PACKAGE_VERSION", package.version_str())
            .env("PKGHOOKS_PACKAGE_PREFIX", package.prefix())
            .envs(&self.spec.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            HookError::failed(
                &self.module,
                &self.hook,
                format!("failed to start '{}': {e}", program.display()),
            )
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // Hooks are free to ignore their input.
            if let Err(e) = stdin.write_all(&payload).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(module = %self.module, hook = %self.hook, stdout = %stdout.trim_end(), "Command hook output");
        }

        if !output.status.success() {
            let stderr: String = String::from_utf8_lossy(&output.stderr)
                .chars()
                .take(STDERR_LIMIT)
                .collect();
            return Err(HookError::HookFailed {
                module: self.module.clone(),
                hook: self.hook.clone(),
                code: output.status.code(),
                message: format!("command exited with {}: {}", output.status, stderr.trim_end()),
            });
        }

        Ok(())
    }

    fn timeout(&self) -> Option<Duration> {
        self.spec.timeout_seconds.map(Duration::from_secs)
    }
}

/// Substitutes invocation placeholders in command arguments.
///
/// Each argument is scanned once, so placeholder text inside a substituted
/// value is kept literally. Unknown `{...}` sequences are left untouched.
pub fn substitute_args(template_args: &[String], invocation: &HookInvocation) -> Vec<String> {
    template_args
        .iter()
        .map(|arg| substitute(arg, invocation))
        .collect()
}

fn substitute(template: &str, invocation: &HookInvocation) -> String {
    let package = &invocation.package;
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };

        let value: Option<Cow<'_, str>> = match &tail[1..close] {
            "hook" => Some(invocation.hook.as_str().into()),
            "module" => Some(invocation.module.as_str().into()),
            "name" => Some(package.name.as_str().into()),
            "version" => Some(package.version_str().into()),
            "prefix" => Some(package.prefix().to_string_lossy()),
            "spec" => Some(package.spec.as_deref().unwrap_or("").into()),
            _ => None,
        };

        match value {
            Some(value) => {
                out.push_str(&value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// A hook module backed by a TOML manifest.
#[derive(Debug)]
pub struct ManifestModule {
    /// Module name.
    name: String,
    /// Manifest path.
    path: PathBuf,
    /// Attribute name → attribute.
    attributes: HashMap<String, ModuleAttr>,
}

impl ManifestModule {
    /// Reads and parses a manifest file.
    pub async fn load(name: &str, path: &Path) -> Result<Self, HookError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(name, path, &text)
    }

    /// Parses manifest text. `path` locates the manifest for relative
    /// commands and working directories; a relative `path` is anchored at
    /// the current directory.
    pub fn parse(name: &str, path: &Path, text: &str) -> Result<Self, HookError> {
        let table: toml::Table = toml::from_str(text).map_err(|e| HookError::ManifestParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => std::path::absolute(parent)?,
            _ => std::env::current_dir()?,
        };

        let mut attributes = HashMap::with_capacity(table.len());
        for (key, value) in table {
            let is_command = value
                .as_table()
                .is_some_and(|t| t.contains_key("command"));

            let attr = if is_command {
                let spec: CommandHook = value.try_into().map_err(|e| {
                    HookError::InvalidHook {
                        module: name.to_string(),
                        hook: key.clone(),
                        message: e.to_string(),
                    }
                })?;
                validate_command(name, &key, &spec)?;

                ModuleAttr::Callable(Arc::new(CommandCallable {
                    module: name.to_string(),
                    hook: key.clone(),
                    base_dir: base_dir.clone(),
                    spec,
                }))
            } else {
                ModuleAttr::Value
            };

            attributes.insert(key, attr);
        }

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            attributes,
        })
    }
}

fn validate_command(module: &str, hook: &str, spec: &CommandHook) -> Result<(), HookError> {
    let invalid = |message: &str| HookError::InvalidHook {
        module: module.to_string(),
        hook: hook.to_string(),
        message: message.to_string(),
    };

    if spec.command.trim().is_empty() {
        return Err(invalid("command must not be empty"));
    }
    if spec.timeout_seconds == Some(0) {
        return Err(invalid("timeout_seconds must be greater than zero"));
    }
    Ok(())
}

impl HookModule for ManifestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModuleKind {
        ModuleKind::Manifest
    }

    fn source(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn lookup(&self, attr: &str) -> Option<ModuleAttr> {
        self.attributes.get(attr).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::HookName;
    use pkghooks_core::Package;

    const MANIFEST: &str = r#"
description = "Regenerate environment modules"
post_install = "not a table"

[pre_install]
command = "true"

[pre_uninstall]
note = "tables without a command are data"
"#;

    fn invocation(hook: HookName) -> HookInvocation {
        HookInvocation::new(
            hook,
            "modulefiles",
            Package::new("zlib", "/opt/zlib")
                .with_version("1.3")
                .with_spec("zlib@1.3%gcc"),
        )
    }

    #[test]
    fn test_parse_classifies_attributes() {
        let module =
            ManifestModule::parse("modulefiles", Path::new("/hooks/modulefiles.toml"), MANIFEST)
                .expect("parse");

        assert_eq!(module.name(), "modulefiles");
        assert_eq!(module.kind(), ModuleKind::Manifest);
        assert_eq!(module.source(), Some(Path::new("/hooks/modulefiles.toml")));
        assert!(module.lookup("pre_install").expect("defined").is_callable());
        assert!(!module.lookup("post_install").expect("defined").is_callable());
        assert!(!module.lookup("pre_uninstall").expect("defined").is_callable());
        assert!(!module.lookup("description").expect("defined").is_callable());
        assert!(module.lookup("post_uninstall").is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = ManifestModule::parse("broken", Path::new("/hooks/broken.toml"), "[pre_install")
            .expect_err("invalid toml");
        assert!(matches!(err, HookError::ManifestParse { .. }));
    }

    #[test]
    fn test_unknown_command_field_is_invalid_hook() {
        let text = "[post_install]\ncommand = \"true\"\nretries = 3\n";
        let err = ManifestModule::parse("strict", Path::new("/hooks/strict.toml"), text)
            .expect_err("unknown field");
        assert!(
            matches!(err, HookError::InvalidHook { module, hook, .. } if module == "strict" && hook == "post_install")
        );
    }

    #[test]
    fn test_empty_command_is_invalid_hook() {
        let text = "[post_install]\ncommand = \"  \"\n";
        let err = ManifestModule::parse("empty", Path::new("/hooks/empty.toml"), text)
            .expect_err("empty command");
        assert!(matches!(err, HookError::InvalidHook { .. }));
    }

    #[test]
    fn test_substitute_args() {
        let args = vec![
            "{hook}:{module}".to_string(),
            "{name}@{version}".to_string(),
            "--prefix={prefix}".to_string(),
            "{spec}".to_string(),
        ];
        let out = substitute_args(&args, &invocation(HookName::PostInstall));
        assert_eq!(
            out,
            vec![
                "post_install:modulefiles",
                "zlib@1.3",
                "--prefix=/opt/zlib",
                "zlib@1.3%gcc",
            ]
        );
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let invocation = HookInvocation::new(
            HookName::PreInstall,
            "modulefiles",
            Package::new("odd{prefix}", "/opt/odd").with_version("{name}"),
        );
        let args = vec![
            "{name}:{version}".to_string(),
            "{unknown} {prefix".to_string(),
            "{{spec}}".to_string(),
        ];
        assert_eq!(
            substitute_args(&args, &invocation),
            vec!["odd{prefix}:{name}", "{unknown} {prefix", "{}"]
        );
    }

    #[test]
    fn test_relative_paths_resolve_against_manifest_dir() {
        let bound = CommandCallable {
            module: "regen".to_string(),
            hook: "post_install".to_string(),
            base_dir: PathBuf::from("/hooks"),
            spec: CommandHook {
                command: "./bin/regen.sh".to_string(),
                args: Vec::new(),
                env: HashMap::new(),
                working_dir: Some(PathBuf::from("work")),
                timeout_seconds: None,
            },
        };
        assert_eq!(bound.program(), PathBuf::from("/hooks/bin/regen.sh"));
        assert_eq!(bound.working_dir(), PathBuf::from("/hooks/work"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_receives_env_and_stdin() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("record.toml");
        let text = r#"
[post_install]
command = "sh"
args = ["-c", "echo \"$PKGHOOKS_HOOK $PKGHOOKS_PACKAGE_NAME $PKGHOOKS_PACKAGE_VERSION {prefix}\" > env.txt; cat > stdin.json"]
"#;
        let module = ManifestModule::parse("record", &manifest, text).expect("parse");
        let Some(ModuleAttr::Callable(hook)) = module.lookup("post_install") else {
            panic!("expected callable");
        };

        hook.call(&invocation(HookName::PostInstall))
            .await
            .expect("hook should succeed");

        let env = std::fs::read_to_string(dir.path().join("env.txt")).expect("env.txt");
        assert_eq!(env.trim(), "post_install zlib 1.3 /opt/zlib");

        let stdin = std::fs::read_to_string(dir.path().join("stdin.json")).expect("stdin.json");
        let payload: serde_json::Value = serde_json::from_str(&stdin).expect("json payload");
        assert_eq!(payload["package"]["name"], "zlib");
        assert_eq!(payload["hook"], "post_install");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure_with_code() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manifest = dir.path().join("fail.toml");
        let text = "[pre_install]\ncommand = \"sh\"\nargs = [\"-c\", \"echo nope >&2; exit 3\"]\n";
        let module = ManifestModule::parse("fail", &manifest, text).expect("parse");
        let Some(ModuleAttr::Callable(hook)) = module.lookup("pre_install") else {
            panic!("expected callable");
        };

        let err = hook
            .call(&invocation(HookName::PreInstall))
            .await
            .expect_err("hook should fail");
        match err {
            HookError::HookFailed { code, message, .. } => {
                assert_eq!(code, Some(3));
                assert!(message.contains("nope"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_timeout_override() {
        let text = "[pre_install]\ncommand = \"true\"\ntimeout_seconds = 7\n";
        let module =
            ManifestModule::parse("slow", Path::new("/hooks/slow.toml"), text).expect("parse");
        let Some(ModuleAttr::Callable(hook)) = module.lookup("pre_install") else {
            panic!("expected callable");
        };
        assert_eq!(hook.timeout(), Some(Duration::from_secs(7)));
    }
}
