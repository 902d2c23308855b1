//! # cordova
//!
//! Command-line tool for creating cross-platform mobile projects and building
//! their native platforms.
//!
//! ## Quick Start
//!
//! ```bash
//! # Create a project
//! cordova create hello --id com.example.hello --name Hello
//! cd hello
//!
//! # Add platforms (build order follows the order they were added)
//! cordova platform add android ios
//!
//! # Build everything, or a subset
//! cordova build
//! cordova build ios --release --report build-report.json
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `create` | Create a new project |
//! | `platform add` | Add one or more native platforms |
//! | `platform rm` | Remove a platform and its native project |
//! | `platform ls` | List added and available platforms |
//! | `build` | Sync and build platforms, wrapped in lifecycle hooks |
//!
//! ## Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Every selected platform built |
//! | 1 | At least one platform failed, or the run was aborted |
//! | 2 | Nothing was built: not a project, no platforms, or unknown platform |
//! | 3 | A lifecycle hook failed |

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use cordova_lib::{
    AppConfig, BuildDispatcher, BuildError, BuildOutcome, BuildProfile, BuildRequest,
    CommandRunner, DryRunRunner, HookNotifier, NamedTargetResolver, PlatformName,
    PlatformSelectionInput, PlatformStatus, ProjectContext, ScriptHooks, SystemRunner, codegen,
};
use serde_json::json;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing_subscriber::EnvFilter;

/// Build orchestrator for cross-platform mobile projects.
#[derive(Parser, Debug)]
#[command(name = "cordova", author, version, about = "Cross-platform mobile build orchestrator", long_about = None)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log hook scripts and build commands instead of running them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new project.
    Create {
        /// Directory to create the project in.
        dir: PathBuf,
        #[arg(long, help = "Reverse-domain app identifier, e.g. com.example.hello")]
        id: Option<String>,
        #[arg(long, help = "Display name of the app")]
        name: Option<String>,
    },
    /// Manage the platforms added to the project.
    Platform {
        #[command(subcommand)]
        action: PlatformCommand,
    },
    /// Sync and build platforms. With no names, builds every added platform.
    Build {
        /// Platforms to build, in order.
        platforms: Vec<String>,
        #[arg(long, help = "Build with the release profile")]
        release: bool,
        #[arg(long, help = "Configured BlackBerry target to deploy to, skipping the prompt")]
        device_target: Option<String>,
        #[arg(long, help = "Write a JSON build report to this path")]
        report: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum PlatformCommand {
    /// Add one or more platforms.
    Add {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Remove a platform and delete its native project.
    #[command(alias = "remove")]
    Rm { name: String },
    /// List added and available platforms.
    #[command(alias = "list")]
    Ls,
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let cwd = env::current_dir().context("resolving current directory")?;
    execute(cli, &cwd)
}

/// Runs a parsed command from `cwd`.
pub fn execute(cli: Cli, cwd: &Path) -> Result<ExitCode> {
    match cli.command {
        Command::Create { dir, id, name } => cmd_create(&cwd.join(dir), id, name),
        Command::Platform { action } => {
            let context = require_project(cwd)?;
            match action {
                PlatformCommand::Add { names } => cmd_platform_add(&context, &names),
                PlatformCommand::Rm { name } => cmd_platform_rm(&context, &name),
                PlatformCommand::Ls => cmd_platform_ls(&context),
            }
        }
        Command::Build {
            platforms,
            release,
            device_target,
            report,
        } => cmd_build(
            cwd,
            BuildArgs {
                platforms,
                release,
                device_target,
                report,
                dry_run: cli.dry_run,
            },
        ),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when embedded.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Loads `.env.local` from the project root so hooks and build scripts see it.
fn load_dotenv(context: &ProjectContext) {
    let path = context.root().join(".env.local");
    if path.is_file() {
        match dotenvy::from_path(&path) {
            Ok(()) => tracing::debug!(path = %path.display(), "loaded environment"),
            Err(err) => tracing::warn!(path = %path.display(), error = %err, "ignoring .env.local"),
        }
    }
}

fn require_project(cwd: &Path) -> Result<ProjectContext> {
    ProjectContext::resolve(cwd).ok_or_else(|| {
        BuildError::NotACordovaProject {
            cwd: cwd.to_path_buf(),
        }
        .into()
    })
}

fn parse_platform(name: &str) -> Result<PlatformName> {
    name.parse().map_err(|_| {
        let supported: Vec<&str> = PlatformName::ALL.iter().map(|p| p.as_str()).collect();
        anyhow!(
            "unsupported platform '{}'. Supported platforms: {}",
            name,
            supported.join(", ")
        )
    })
}

fn cmd_create(dir: &Path, id: Option<String>, name: Option<String>) -> Result<ExitCode> {
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let defaults = AppConfig::default();
    let app = AppConfig {
        id: id.unwrap_or_else(|| codegen::default_app_id(&dir_name)),
        name: name.unwrap_or_else(|| {
            if dir_name.is_empty() {
                defaults.name.clone()
            } else {
                dir_name.clone()
            }
        }),
        ..defaults
    };

    println!("Creating project {} ({})", app.name, app.id);
    codegen::create_project(dir, app)
        .with_context(|| format!("creating project in {}", dir.display()))?;

    println!("\nProject created at {}", dir.display());
    println!("\nNext steps:");
    println!("  1. cd {}", dir.display());
    println!("  2. cordova platform add <android|ios|blackberry>");
    println!("  3. Put build hooks in .cordova/hooks/before_build and after_build");
    println!("  4. cordova build");
    Ok(ExitCode::SUCCESS)
}

fn cmd_platform_add(context: &ProjectContext, names: &[String]) -> Result<ExitCode> {
    for name in names {
        let platform = parse_platform(name)?;
        let native_dir = codegen::add_platform(context, platform)
            .with_context(|| format!("adding platform {}", platform))?;
        println!("Added {} at {}", platform, native_dir.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_platform_rm(context: &ProjectContext, name: &str) -> Result<ExitCode> {
    let platform = parse_platform(name)?;
    codegen::remove_platform(context, platform)
        .with_context(|| format!("removing platform {}", platform))?;
    println!("Removed {}", platform);
    Ok(ExitCode::SUCCESS)
}

fn cmd_platform_ls(context: &ProjectContext) -> Result<ExitCode> {
    let config = context.load_config()?;
    println!("Installed platforms:");
    if config.platforms.is_empty() {
        println!("  (none)");
    }
    for entry in &config.platforms {
        println!("  {:<11} {}", entry.name, entry.relative_path().display());
    }
    let available: Vec<&str> = PlatformName::ALL
        .iter()
        .filter(|p| config.platform(**p).is_none())
        .map(|p| p.as_str())
        .collect();
    if !available.is_empty() {
        println!("Available platforms: {}", available.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

struct BuildArgs {
    platforms: Vec<String>,
    release: bool,
    device_target: Option<String>,
    report: Option<PathBuf>,
    dry_run: bool,
}

fn cmd_build(cwd: &Path, args: BuildArgs) -> Result<ExitCode> {
    if let Some(context) = ProjectContext::resolve(cwd) {
        load_dotenv(&context);
    }

    let runner: &dyn CommandRunner = if args.dry_run {
        &DryRunRunner
    } else {
        &SystemRunner
    };
    let hooks: Box<dyn HookNotifier> = if args.dry_run {
        Box::new(ScriptHooks::with_runner(DryRunRunner))
    } else {
        Box::new(ScriptHooks::new())
    };
    let named_target = args.device_target.map(NamedTargetResolver::new);
    let mut dispatcher = BuildDispatcher::new(hooks.as_ref(), runner);
    if let Some(targets) = &named_target {
        dispatcher = dispatcher.target_resolver(targets);
    }

    let profile = if args.release {
        BuildProfile::Release
    } else {
        BuildProfile::Debug
    };
    let request = BuildRequest::new(cwd)
        .platforms(PlatformSelectionInput::from(args.platforms))
        .profile(profile);
    let outcome = dispatcher.build(&request)?;

    print_summary(&outcome);
    if let Some(path) = &args.report {
        write_report(path, &outcome)?;
        println!("\nReport written to {}", path.display());
    }
    if let Some(err) = outcome.after_build_failure() {
        return Err(err.into());
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_summary(outcome: &BuildOutcome) {
    println!("\nBuild summary:");
    for result in &outcome.platforms {
        let status = match &result.status {
            PlatformStatus::Succeeded => format!("ok ({} ms)", result.duration_ms),
            PlatformStatus::Failed { detail } => format!("FAILED: {}", first_line(detail)),
            PlatformStatus::Aborted { detail } => format!("ABORTED: {}", first_line(detail)),
            PlatformStatus::Skipped => "skipped".to_string(),
        };
        println!("  {:<11} {}", result.platform, status);
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

fn build_report(outcome: &BuildOutcome) -> serde_json::Value {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());
    json!({
        "generated_at": generated_at,
        "overall": outcome.overall(),
        "outcome": outcome,
    })
}

fn write_report(path: &Path, outcome: &BuildOutcome) -> Result<()> {
    let contents = serde_json::to_string_pretty(&build_report(outcome))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating report directory {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("writing report to {}", path.display()))
}
