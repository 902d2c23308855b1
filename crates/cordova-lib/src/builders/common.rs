//! Common utilities shared between the platform adapters.
//!
//! - **Command model** - [`BuildCommand`] describes an external invocation;
//!   a [`CommandRunner`] executes it. Swapping the runner is how dry runs and
//!   tests observe builds without spawning anything.
//! - **Sync helpers** - copying the shared `www/` tree and writing generated
//!   metadata files deterministically so repeated syncs converge.

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::types::{BuildError, PlatformName};

/// Number of stderr lines kept in a failure detail.
const STDERR_TAIL_LINES: usize = 20;

/// An external command constructed by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    program: OsString,
    args: Vec<Arg>,
    cwd: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Arg {
    value: OsString,
    /// Shown as `******` in logs when set. Only the part after the first `=`
    /// is masked, so `-Dkey=value` stays readable.
    secret: bool,
}

impl BuildCommand {
    /// Starts a command that runs `program` from `cwd`.
    pub fn new(program: impl Into<OsString>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    /// Appends an argument.
    pub fn arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: false,
        });
        self
    }

    /// Appends an argument whose value must not appear in logs.
    pub fn secret_arg(mut self, value: impl Into<OsString>) -> Self {
        self.args.push(Arg {
            value: value.into(),
            secret: true,
        });
        self
    }

    pub fn program(&self) -> &std::ffi::OsStr {
        &self.program
    }

    /// Raw argument values, secrets included.
    pub fn args(&self) -> impl Iterator<Item = &std::ffi::OsStr> {
        self.args.iter().map(|a| a.value.as_os_str())
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Converts to a `std::process::Command` ready to spawn.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args()).current_dir(&self.cwd);
        cmd
    }
}

impl fmt::Display for BuildCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            let text = arg.value.to_string_lossy();
            let shown = match (arg.secret, text.split_once('=')) {
                (false, _) => text.into_owned(),
                (true, Some((key, _))) => format!("{}=******", key),
                (true, None) => "******".to_string(),
            };
            write!(f, " {}", quote(&shown))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '"') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

/// Captured result of running a [`BuildCommand`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a process that exited with `code` and printed nothing.
    pub fn with_code(code: i32) -> Self {
        Self {
            code: Some(code),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    fn describe_status(&self) -> String {
        match self.code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Executes external commands on behalf of adapters and hooks.
pub trait CommandRunner {
    /// Runs the command to completion.
    ///
    /// `Err` means the process could not be started at all.
    fn run(&self, command: &BuildCommand) -> io::Result<CommandOutput>;
}

/// Spawns real processes, capturing stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: &BuildCommand) -> io::Result<CommandOutput> {
        tracing::debug!(command = %command, cwd = %command.cwd().display(), "running");
        let output = command.to_command().output()?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Logs commands instead of running them and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run(&self, command: &BuildCommand) -> io::Result<CommandOutput> {
        tracing::info!(command = %command, "[dry-run] would run");
        Ok(CommandOutput::with_code(0))
    }
}

/// Runs a platform build command and classifies the result.
///
/// A non-zero exit or a process that cannot be started is a
/// [`BuildError::PlatformBuildFailed`]; the caller records it and moves on.
pub fn run_build_command(
    runner: &dyn CommandRunner,
    platform: PlatformName,
    command: &BuildCommand,
) -> Result<(), BuildError> {
    tracing::info!(%platform, command = %command, "invoking platform build");
    let output = runner.run(command).map_err(|e| BuildError::PlatformBuildFailed {
        platform,
        detail: format!(
            "failed to start `{}`: {}. Ensure the native project is intact (re-add the platform if needed)",
            command, e
        ),
    })?;

    if !output.success() {
        let detail = format!(
            "`{}` exited with {}{}",
            command,
            output.describe_status(),
            stderr_tail(&output.stderr)
        );
        tracing::warn!(%platform, "{}", detail);
        return Err(BuildError::PlatformBuildFailed { platform, detail });
    }
    Ok(())
}

/// Formats the last lines of stderr for inclusion in an error message.
pub fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!("\n\nStderr:\n{}", lines[start..].join("\n"))
}

/// Replaces `dest` with a fresh recursive copy of `src`.
///
/// Files that exist only in `dest` are removed, so the result depends on
/// `src` alone. Fails with `InvalidInput`, touching nothing, when the two
/// directories overlap.
pub fn replace_dir(src: &Path, dest: &Path) -> io::Result<()> {
    let src_real = fs::canonicalize(src)?;
    let dest_real = fs::canonicalize(dest).or_else(|_| std::path::absolute(dest))?;
    if dest_real.starts_with(&src_real) || src_real.starts_with(&dest_real) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} overlaps the source directory {}; check the platform path in .cordova/config.toml",
                dest.display(),
                src.display()
            ),
        ));
    }
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    copy_dir_recursive(src, dest)
}

/// Recursively copies a directory.
pub fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&path, &dest_path)?;
        } else {
            fs::copy(&path, &dest_path)?;
        }
    }
    Ok(())
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write_generated(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

/// Escapes text for use inside XML element content or attribute values.
pub fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Fails with [`BuildError::AdapterFatal`] unless the sync inputs exist.
pub fn check_sync_inputs(
    platform: PlatformName,
    native_dir: &Path,
    www_dir: &Path,
) -> Result<(), BuildError> {
    if !native_dir.is_dir() {
        return Err(BuildError::AdapterFatal {
            platform,
            detail: format!(
                "native project not found at {}.\n\n\
                 Re-add it with: cordova platform rm {platform} && cordova platform add {platform}",
                native_dir.display()
            ),
        });
    }
    if !www_dir.is_dir() {
        return Err(BuildError::AdapterFatal {
            platform,
            detail: format!(
                "shared web assets not found at {}. Every project needs a www/ directory",
                www_dir.display()
            ),
        });
    }
    Ok(())
}

/// Wraps an I/O failure during sync as fatal for the platform.
pub fn sync_failed(platform: PlatformName, what: &str, err: io::Error) -> BuildError {
    BuildError::AdapterFatal {
        platform,
        detail: format!("failed to {}: {}", what, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedRunner {
        output: io::Result<CommandOutput>,
        calls: Mutex<usize>,
    }

    impl CommandRunner for FixedRunner {
        fn run(&self, _command: &BuildCommand) -> io::Result<CommandOutput> {
            *self.calls.lock().unwrap() += 1;
            match &self.output {
                Ok(out) => Ok(out.clone()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    #[test]
    fn display_masks_secret_values() {
        let cmd = BuildCommand::new("ant", "/tmp")
            .arg("-f")
            .arg("/tmp/my project/build.xml")
            .secret_arg("-Dqnx.device.password=hunter2");
        let shown = cmd.to_string();
        assert_eq!(
            shown,
            "ant -f \"/tmp/my project/build.xml\" -Dqnx.device.password=******"
        );
        assert!(cmd.args().any(|a| a == "-Dqnx.device.password=hunter2"));
    }

    #[test]
    fn nonzero_exit_is_platform_failure_with_stderr() {
        let runner = FixedRunner {
            output: Ok(CommandOutput {
                code: Some(2),
                stdout: String::new(),
                stderr: "BUILD FAILED\n".into(),
            }),
            calls: Mutex::new(0),
        };
        let cmd = BuildCommand::new("build", "/tmp");
        let err = run_build_command(&runner, PlatformName::Android, &cmd).unwrap_err();
        match err {
            BuildError::PlatformBuildFailed { platform, detail } => {
                assert_eq!(platform, PlatformName::Android);
                assert!(detail.contains("exit status 2"));
                assert!(detail.contains("BUILD FAILED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(*runner.calls.lock().unwrap(), 1);
    }

    #[test]
    fn spawn_failure_is_platform_failure() {
        let runner = FixedRunner {
            output: Err(io::Error::new(io::ErrorKind::NotFound, "no such file")),
            calls: Mutex::new(0),
        };
        let cmd = BuildCommand::new("missing", "/tmp");
        let err = run_build_command(&runner, PlatformName::Ios, &cmd).unwrap_err();
        assert!(matches!(err, BuildError::PlatformBuildFailed { .. }));
        assert!(err.to_string().contains("failed to start"));
    }

    #[test]
    fn system_runner_reports_missing_program() {
        let cmd = BuildCommand::new("nonexistent-command-12345", std::env::temp_dir());
        assert!(SystemRunner.run(&cmd).is_err());
    }

    #[test]
    fn stderr_tail_keeps_last_lines() {
        let stderr: String = (0..50).map(|i| format!("line {i}\n")).collect();
        let tail = stderr_tail(&stderr);
        assert!(tail.contains("line 49"));
        assert!(!tail.contains("line 29\n"));
        assert_eq!(stderr_tail("   \n"), "");
    }

    #[test]
    fn replace_dir_drops_stale_files() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src");
        let dest = temp_dir.path().join("dest");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("index.html"), "<html/>").unwrap();
        fs::write(src.join("css/app.css"), "body{}").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.js"), "old").unwrap();

        replace_dir(&src, &dest).unwrap();

        assert!(dest.join("index.html").is_file());
        assert!(dest.join("css/app.css").is_file());
        assert!(!dest.join("stale.js").exists());
    }

    #[test]
    fn replace_dir_refuses_overlapping_paths() {
        let temp_dir = TempDir::new().unwrap();
        let www = temp_dir.path().join("www");
        fs::create_dir_all(&www).unwrap();
        fs::write(www.join("index.html"), "<html/>").unwrap();

        let err = replace_dir(&www, &temp_dir.path().join("./www")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        let err = replace_dir(&www, &www.join("nested")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(www.join("index.html").is_file());
    }

    #[test]
    fn xml_escape_handles_markup() {
        assert_eq!(xml_escape("Tom & \"Jerry\" <3"), "Tom &amp; &quot;Jerry&quot; &lt;3");
    }
}
