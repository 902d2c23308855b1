//! Lifecycle hooks.
//!
//! The dispatcher only needs [`HookNotifier::fire`]. [`ScriptHooks`] is the
//! implementation used by the CLI: it runs every script found in
//! `.cordova/hooks/<event>/`, in file name order.
//!
//! ```text
//! .cordova/hooks/
//! ├── before_build/
//! │   ├── 01_lint.sh
//! │   └── 02_bump_version.sh
//! └── after_build/
//!     └── notify.sh
//! ```

use crate::builders::common::{BuildCommand, CommandRunner, SystemRunner, stderr_tail};
use crate::project::ProjectContext;
use crate::types::BuildError;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Build lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeBuild,
    AfterBuild,
}

impl HookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::BeforeBuild => "before_build",
            HookEvent::AfterBuild => "after_build",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requests that a lifecycle event be fired.
///
/// `Ok(())` acknowledges the event. An `Err` is propagated by the dispatcher
/// unchanged.
pub trait HookNotifier {
    fn fire(&self, event: HookEvent, context: &ProjectContext) -> Result<(), BuildError>;
}

/// Runs hook scripts from `.cordova/hooks/<event>/`.
///
/// Each script runs with the project root as working directory and as its only
/// argument. Hidden files are ignored; on Unix, files without an execute bit
/// are skipped with a warning.
#[derive(Debug, Clone, Default)]
pub struct ScriptHooks<R = SystemRunner> {
    runner: R,
}

impl ScriptHooks {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: CommandRunner> ScriptHooks<R> {
    /// Uses a custom runner, e.g. [`crate::builders::DryRunRunner`].
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    /// Scripts that would run for `event`, in execution order.
    pub fn scripts(&self, event: HookEvent, context: &ProjectContext) -> Result<Vec<PathBuf>, BuildError> {
        let dir = context.hooks_dir().join(event.as_str());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut scripts = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden || !entry.file_type()?.is_file() {
                continue;
            }
            if !is_executable(&path) {
                tracing::warn!(hook = %path.display(), "skipping hook without execute permission");
                continue;
            }
            scripts.push(path);
        }
        scripts.sort();
        Ok(scripts)
    }
}

impl<R: CommandRunner> HookNotifier for ScriptHooks<R> {
    fn fire(&self, event: HookEvent, context: &ProjectContext) -> Result<(), BuildError> {
        let scripts = self.scripts(event, context)?;
        tracing::info!(%event, scripts = scripts.len(), "firing hook");

        for script in scripts {
            let command = BuildCommand::new(&script, context.root()).arg(context.root());
            let output = self.runner.run(&command).map_err(|e| BuildError::Hook {
                event: event.to_string(),
                detail: format!("failed to start {}: {}", script.display(), e),
            })?;
            if !output.success() {
                return Err(BuildError::Hook {
                    event: event.to_string(),
                    detail: format!(
                        "{} exited with {}{}",
                        script.display(),
                        output
                            .code
                            .map_or_else(|| "a signal".to_string(), |c| format!("exit status {}", c)),
                        stderr_tail(&output.stderr)
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}
