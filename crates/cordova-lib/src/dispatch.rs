//! Build dispatch engine.
//!
//! One call to [`BuildDispatcher::build`] is one build invocation:
//!
//! 1. resolve the project from the request's working directory
//! 2. load the platform registry and reject an empty one
//! 3. resolve the platform selection
//! 4. fire `before_build` once
//! 5. sync then build each selected platform, in order
//! 6. fire `after_build` once
//! 7. return the aggregated [`BuildOutcome`]
//!
//! Steps 1-3 fail without side effects. Once `before_build` has fired, every
//! selected platform is accounted for in the outcome and `after_build` fires
//! before control returns, even when platforms fail or an adapter aborts the run.

use crate::builders::{
    BuildEnv, CommandRunner, PlatformBuildAdapter, PromptTargetResolver, TargetResolver,
};
use crate::hooks::{HookEvent, HookNotifier};
use crate::project::ProjectContext;
use crate::registry::PlatformRegistry;
use crate::selection::{PlatformSelection, PlatformSelectionInput};
use crate::types::{BuildError, BuildOutcome, BuildProfile, PlatformName, PlatformStatus};
use std::path::PathBuf;
use std::time::Instant;

/// Parameters of one build invocation.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory the project is resolved from (walking upward).
    pub working_dir: PathBuf,
    pub selection: PlatformSelectionInput,
    pub profile: BuildProfile,
}

impl BuildRequest {
    /// Builds every registered platform, debug profile.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            selection: PlatformSelectionInput::All,
            profile: BuildProfile::Debug,
        }
    }

    pub fn platforms(mut self, selection: impl Into<PlatformSelectionInput>) -> Self {
        self.selection = selection.into();
        self
    }

    pub fn profile(mut self, profile: BuildProfile) -> Self {
        self.profile = profile;
        self
    }
}

/// Orchestrates hooks and platform adapters for build invocations.
///
/// # Example
///
/// ```ignore
/// use cordova_lib::{BuildDispatcher, BuildRequest, ScriptHooks, SystemRunner};
///
/// let hooks = ScriptHooks::new();
/// let dispatcher = BuildDispatcher::new(&hooks, &SystemRunner);
/// let outcome = dispatcher.build(&BuildRequest::new(".").platforms("android"))?;
/// assert!(outcome.is_success());
/// ```
pub struct BuildDispatcher<'a> {
    hooks: &'a dyn HookNotifier,
    runner: &'a dyn CommandRunner,
    targets: &'a dyn TargetResolver,
}

impl<'a> BuildDispatcher<'a> {
    /// Device targets are confirmed interactively unless
    /// [`BuildDispatcher::target_resolver`] says otherwise.
    pub fn new(hooks: &'a dyn HookNotifier, runner: &'a dyn CommandRunner) -> Self {
        Self {
            hooks,
            runner,
            targets: &PromptTargetResolver,
        }
    }

    pub fn target_resolver(mut self, targets: &'a dyn TargetResolver) -> Self {
        self.targets = targets;
        self
    }

    /// Runs one build invocation and returns its outcome.
    ///
    /// `Err` is returned for precondition failures (nothing happened) and for
    /// a failing `before_build` hook. Platform failures, including
    /// adapter-fatal ones, and a failing `after_build` hook are reported
    /// through the returned [`BuildOutcome`].
    pub fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let context = ProjectContext::resolve(&request.working_dir).ok_or_else(|| {
            BuildError::NotACordovaProject {
                cwd: request.working_dir.clone(),
            }
        })?;

        let registry = PlatformRegistry::load(&context)?;
        if registry.is_empty() {
            return Err(BuildError::NoPlatformsAdded {
                root: context.root().to_path_buf(),
            });
        }

        let selection = PlatformSelection::resolve(&request.selection, &registry)?;
        tracing::info!(
            root = %context.root().display(),
            platforms = ?selection.platforms(),
            profile = request.profile.as_str(),
            "starting build"
        );

        self.hooks.fire(HookEvent::BeforeBuild, &context)?;

        let env = BuildEnv {
            runner: self.runner,
            targets: self.targets,
            profile: request.profile,
        };
        let mut outcome = BuildOutcome::default();
        let mut aborted = false;
        for &platform in &selection {
            if aborted {
                tracing::info!(%platform, "skipped after fatal adapter error");
                outcome.record(platform, PlatformStatus::Skipped, 0);
                continue;
            }

            let started = Instant::now();
            let status = match build_platform(&registry, platform, &env) {
                Ok(()) => {
                    tracing::info!(%platform, "build succeeded");
                    PlatformStatus::Succeeded
                }
                Err(BuildError::PlatformBuildFailed { detail, .. }) => {
                    tracing::warn!(%platform, "build failed");
                    PlatformStatus::Failed { detail }
                }
                Err(err) => {
                    tracing::error!(%platform, error = %err, "aborting remaining platforms");
                    aborted = true;
                    let detail = match err {
                        BuildError::AdapterFatal { detail, .. } => detail,
                        other => other.to_string(),
                    };
                    PlatformStatus::Aborted { detail }
                }
            };
            let elapsed = started.elapsed().as_millis();
            outcome.record(platform, status, u64::try_from(elapsed).unwrap_or(u64::MAX));
        }

        if let Err(err) = self.hooks.fire(HookEvent::AfterBuild, &context) {
            tracing::warn!(error = %err, "after_build hook failed");
            outcome.after_build_error = Some(match err {
                BuildError::Hook { detail, .. } => detail,
                other => other.to_string(),
            });
        }

        tracing::info!(overall = ?outcome.overall(), "build finished");
        Ok(outcome)
    }

    /// Same as [`BuildDispatcher::build`], delivering the result to `callback`.
    pub fn build_with_callback<F>(&self, request: &BuildRequest, callback: F)
    where
        F: FnOnce(Result<BuildOutcome, BuildError>),
    {
        callback(self.build(request));
    }
}

fn build_platform(
    registry: &PlatformRegistry,
    platform: PlatformName,
    env: &BuildEnv<'_>,
) -> Result<(), BuildError> {
    let adapter = registry.get_adapter(platform)?;
    adapter.sync_project()?;
    adapter.invoke_build(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{BuildCommand, CommandOutput, NamedTargetResolver};
    use crate::config::{DeviceTarget, PlatformEntry, ProjectConfig, TargetKind};
    use crate::types::OverallStatus;
    use std::fs;
    use std::io;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records hook firings and command runs into one journal, so relative
    /// ordering can be asserted.
    #[derive(Default)]
    struct Recorder {
        journal: Mutex<Vec<String>>,
        commands: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
        failing_hook: Option<HookEvent>,
    }

    impl Recorder {
        fn failing(platforms: &[&'static str]) -> Self {
            Self {
                failing: platforms.to_vec(),
                ..Self::default()
            }
        }

        fn journal(&self) -> Vec<String> {
            self.journal.lock().unwrap().clone()
        }

        fn runs(&self) -> Vec<String> {
            self.journal()
                .into_iter()
                .filter(|e| e.starts_with("run "))
                .collect()
        }

        fn hook_count(&self, event: HookEvent) -> usize {
            self.journal()
                .iter()
                .filter(|e| *e == event.as_str())
                .count()
        }
    }

    impl HookNotifier for Recorder {
        fn fire(&self, event: HookEvent, _context: &ProjectContext) -> Result<(), BuildError> {
            self.journal.lock().unwrap().push(event.to_string());
            if self.failing_hook == Some(event) {
                return Err(BuildError::Hook {
                    event: event.to_string(),
                    detail: "exit status 1".into(),
                });
            }
            Ok(())
        }
    }

    impl CommandRunner for Recorder {
        fn run(&self, command: &BuildCommand) -> io::Result<CommandOutput> {
            let platform = command
                .cwd()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.journal.lock().unwrap().push(format!("run {platform}"));
            self.commands.lock().unwrap().push(command.to_string());
            let code = if self.failing.iter().any(|f| *f == platform) { 1 } else { 0 };
            Ok(CommandOutput::with_code(code))
        }
    }

    fn project(platforms: &[PlatformName]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let mut config = ProjectConfig::default();
        for platform in platforms {
            config.add_platform(PlatformEntry::new(*platform)).unwrap();
            fs::create_dir_all(root.join("platforms").join(platform.as_str())).unwrap();
        }
        config.blackberry.targets.push(DeviceTarget {
            name: "q10".into(),
            ip: "169.254.0.1".into(),
            password: None,
            kind: TargetKind::Device,
        });
        config.save_to_file(&ProjectConfig::path_for(root)).unwrap();
        fs::create_dir_all(root.join("www")).unwrap();
        fs::write(root.join("www/index.html"), "<html></html>").unwrap();
        temp_dir
    }

    fn build(
        recorder: &Recorder,
        root: &Path,
        selection: impl Into<PlatformSelectionInput>,
    ) -> Result<BuildOutcome, BuildError> {
        let targets = NamedTargetResolver::new("q10");
        BuildDispatcher::new(recorder, recorder)
            .target_resolver(&targets)
            .build(&BuildRequest::new(root).platforms(selection))
    }

    #[test]
    fn outside_a_project_nothing_happens() {
        let temp_dir = TempDir::new().unwrap();
        let recorder = Recorder::default();
        let err = build(&recorder, temp_dir.path(), None::<String>).unwrap_err();
        assert!(matches!(err, BuildError::NotACordovaProject { .. }));
        assert!(recorder.journal().is_empty());
    }

    #[test]
    fn project_without_platforms_fires_no_hooks() {
        let temp_dir = project(&[]);
        let recorder = Recorder::default();
        let err = build(&recorder, temp_dir.path(), None::<String>).unwrap_err();
        assert!(matches!(err, BuildError::NoPlatformsAdded { .. }));
        assert!(recorder.journal().is_empty());
    }

    #[test]
    fn unknown_platform_fires_no_hooks() {
        let temp_dir = project(&[PlatformName::Android]);
        let recorder = Recorder::default();
        let err = build(&recorder, temp_dir.path(), "ios").unwrap_err();
        assert!(err.is_precondition());
        assert!(recorder.journal().is_empty());
    }

    #[test]
    fn single_platform_hooks_wrap_the_build() {
        let temp_dir = project(&[PlatformName::Android]);
        let recorder = Recorder::default();
        let outcome = build(&recorder, temp_dir.path(), None::<String>).unwrap();
        assert_eq!(
            recorder.journal(),
            vec!["before_build", "run android", "after_build"]
        );
        assert!(outcome.is_success());
        // sync ran before the build
        assert!(temp_dir.path().join("platforms/android/assets/www/index.html").is_file());
    }

    #[test]
    fn resolves_from_a_subdirectory() {
        let temp_dir = project(&[PlatformName::Ios]);
        let nested = temp_dir.path().join("www");
        let recorder = Recorder::default();
        let outcome = build(&recorder, &nested, None::<String>).unwrap();
        assert_eq!(outcome.platforms.len(), 1);
    }

    #[test]
    fn bare_name_and_list_select_only_that_platform() {
        let temp_dir = project(&[PlatformName::Android, PlatformName::Ios]);

        let recorder = Recorder::default();
        build(&recorder, temp_dir.path(), "android").unwrap();
        assert_eq!(recorder.runs(), vec!["run android"]);

        let recorder = Recorder::default();
        build(&recorder, temp_dir.path(), vec!["android".to_string()]).unwrap();
        assert_eq!(recorder.runs(), vec!["run android"]);
    }

    #[test]
    fn no_selection_builds_all_in_registration_order() {
        let temp_dir = project(&[PlatformName::Ios, PlatformName::Android]);
        let recorder = Recorder::default();
        build(&recorder, temp_dir.path(), None::<String>).unwrap();
        assert_eq!(recorder.runs(), vec!["run ios", "run android"]);
        assert_eq!(recorder.hook_count(HookEvent::BeforeBuild), 1);
        assert_eq!(recorder.hook_count(HookEvent::AfterBuild), 1);
    }

    #[test]
    fn unselected_platform_is_never_touched() {
        let temp_dir = project(&[
            PlatformName::Android,
            PlatformName::Ios,
            PlatformName::BlackBerry,
        ]);
        let recorder = Recorder::default();
        let outcome = build(
            &recorder,
            temp_dir.path(),
            vec!["android".to_string(), "ios".to_string()],
        )
        .unwrap();
        assert_eq!(recorder.runs(), vec!["run android", "run ios"]);
        assert!(outcome.get(PlatformName::BlackBerry).is_none());
        assert!(!temp_dir.path().join("platforms/blackberry/www").exists());
    }

    #[test]
    fn failed_platform_does_not_stop_the_next_one() {
        let temp_dir = project(&[PlatformName::Android, PlatformName::Ios]);
        let recorder = Recorder::failing(&["android"]);
        let outcome = build(&recorder, temp_dir.path(), None::<String>).unwrap();

        assert_eq!(outcome.overall(), OverallStatus::PartiallyFailed);
        assert_eq!(outcome.succeeded().collect::<Vec<_>>(), vec![PlatformName::Ios]);
        assert_eq!(
            outcome.failures().map(|(p, _)| p).collect::<Vec<_>>(),
            vec![PlatformName::Android]
        );
        assert_eq!(recorder.journal().last().map(String::as_str), Some("after_build"));
        assert_eq!(recorder.hook_count(HookEvent::AfterBuild), 1);
    }

    #[test]
    fn adapter_fatal_skips_the_rest_but_fires_after_build() {
        let temp_dir = project(&[
            PlatformName::Android,
            PlatformName::Ios,
            PlatformName::BlackBerry,
        ]);
        fs::remove_dir_all(temp_dir.path().join("platforms/ios")).unwrap();

        let recorder = Recorder::default();
        let outcome = build(&recorder, temp_dir.path(), None::<String>).unwrap();

        assert_eq!(outcome.overall(), OverallStatus::Aborted);
        assert!(matches!(
            outcome.get(PlatformName::Ios).unwrap().status,
            PlatformStatus::Aborted { .. }
        ));
        assert_eq!(
            outcome.get(PlatformName::BlackBerry).unwrap().status,
            PlatformStatus::Skipped
        );
        assert_eq!(
            recorder.journal(),
            vec!["before_build", "run android", "after_build"]
        );
    }

    #[test]
    fn failing_before_build_hook_stops_everything() {
        let temp_dir = project(&[PlatformName::Android]);
        let recorder = Recorder {
            failing_hook: Some(HookEvent::BeforeBuild),
            ..Recorder::default()
        };
        let err = build(&recorder, temp_dir.path(), None::<String>).unwrap_err();
        assert!(matches!(err, BuildError::Hook { .. }));
        assert_eq!(recorder.journal(), vec!["before_build"]);
    }

    #[test]
    fn failing_after_build_hook_keeps_platform_results() {
        let temp_dir = project(&[PlatformName::Android, PlatformName::Ios]);
        let recorder = Recorder {
            failing_hook: Some(HookEvent::AfterBuild),
            ..Recorder::failing(&["android"])
        };
        let outcome = build(&recorder, temp_dir.path(), None::<String>).unwrap();

        assert_eq!(
            recorder.journal(),
            vec!["before_build", "run android", "run ios", "after_build"]
        );
        assert_eq!(outcome.overall(), OverallStatus::PartiallyFailed);
        assert!(matches!(
            outcome.get(PlatformName::Android).unwrap().status,
            PlatformStatus::Failed { .. }
        ));
        assert_eq!(outcome.get(PlatformName::Ios).unwrap().status, PlatformStatus::Succeeded);
        assert!(!outcome.is_success());
        let err = outcome.after_build_failure().unwrap();
        assert!(matches!(err, BuildError::Hook { ref event, .. } if event == "after_build"));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn relative_working_directory_resolves_through_parents() {
        let temp_dir = project(&[PlatformName::Android]);
        let nested = temp_dir.path().join("www");
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();
        let recorder = Recorder::default();
        let result = build(&recorder, Path::new("."), None::<String>);
        std::env::set_current_dir(previous).unwrap();

        let outcome = result.unwrap();
        assert!(outcome.is_success());
        assert_eq!(
            recorder.journal(),
            vec!["before_build", "run android", "after_build"]
        );
    }

    #[test]
    fn blackberry_builds_through_ant_with_resolved_target() {
        let temp_dir = project(&[PlatformName::BlackBerry]);
        let recorder = Recorder::default();
        build(&recorder, temp_dir.path(), "blackberry").unwrap();

        let commands = recorder.commands.lock().unwrap().clone();
        assert_eq!(commands.len(), 1);
        assert!(commands[0].starts_with("ant -f "), "{}", commands[0]);
        assert!(commands[0].contains("-Dqnx.device.target=q10"));
        assert!(commands[0].contains("-Dqnx.device.ip=169.254.0.1"));
        assert!(!commands[0].contains("cordova/build"));
    }

    #[test]
    fn callback_receives_the_same_outcome() {
        let temp_dir = project(&[PlatformName::Android]);
        let recorder = Recorder::default();
        let mut received = None;
        BuildDispatcher::new(&recorder, &recorder).build_with_callback(
            &BuildRequest::new(temp_dir.path()).profile(BuildProfile::Release),
            |result| received = Some(result),
        );
        let outcome = received.unwrap().unwrap();
        assert!(outcome.is_success());
        let commands = recorder.commands.lock().unwrap().clone();
        assert!(commands[0].ends_with("--release"));
    }
}
