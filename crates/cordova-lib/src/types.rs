//! Core types for cordova-lib.
//!
//! This module defines the fundamental types used throughout the library:
//!
//! - [`BuildError`] - Error types for project resolution, hooks, and builds
//! - [`PlatformName`] - The fixed set of supported platforms
//! - [`BuildProfile`] - Debug or release builds
//! - [`BuildOutcome`] / [`PlatformOutcome`] - Aggregated results of one build invocation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Error types for cordova-lib operations.
///
/// Precondition failures ([`BuildError::NotACordovaProject`],
/// [`BuildError::NoPlatformsAdded`], [`BuildError::UnknownPlatform`]) are raised
/// before any hook fires or any platform is touched. Per-platform failures are
/// normally captured in a [`BuildOutcome`] instead of being returned.
///
/// # Example
///
/// ```ignore
/// use cordova_lib::{BuildDispatcher, BuildError, BuildRequest};
///
/// match dispatcher.build(&BuildRequest::new(".")) {
///     Ok(outcome) => println!("{:?}", outcome.overall()),
///     Err(BuildError::NoPlatformsAdded { .. }) => {
///         eprintln!("add a platform first");
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// No `.cordova/` marker was found in the working directory or any ancestor.
    #[error(
        "not a Cordova-based project: no .cordova directory found in {} or any parent directory.\n\n\
         Run `cordova create <dir>` first, or change into an existing project.",
        .cwd.display()
    )]
    NotACordovaProject { cwd: PathBuf },

    /// The project exists but has no registered platforms.
    #[error(
        "no platforms added to the project at {}.\n\n\
         Add one with: cordova platform add <android|ios|blackberry>",
        .root.display()
    )]
    NoPlatformsAdded { root: PathBuf },

    /// A selected platform name is not supported or not registered.
    #[error("unknown platform: '{name}'. Platforms added to this project: {registered:?}")]
    UnknownPlatform { name: String, registered: Vec<String> },

    /// `platform add` was asked for a platform that is already registered.
    #[error("platform '{0}' is already added to this project")]
    PlatformAlreadyAdded(String),

    /// The external build process for one platform failed.
    ///
    /// This is recorded per platform and does not stop other platforms.
    #[error("{platform} build failed: {detail}")]
    PlatformBuildFailed { platform: PlatformName, detail: String },

    /// An adapter hit a condition that makes continuing pointless, such as a
    /// failed project sync or an abandoned device-target prompt.
    #[error("{platform} adapter failed fatally: {detail}")]
    AdapterFatal { platform: PlatformName, detail: String },

    /// A lifecycle hook reported failure.
    #[error("{event} hook failed: {detail}")]
    Hook { event: String, detail: String },

    /// Invalid or unreadable project configuration.
    #[error("configuration error: {0}. Check .cordova/config.toml")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}. Check file paths and permissions")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Returns `true` for failures raised before any externally observable effect.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            BuildError::NotACordovaProject { .. }
                | BuildError::NoPlatformsAdded { .. }
                | BuildError::UnknownPlatform { .. }
        )
    }

    /// Process exit code used by the CLI for this error.
    ///
    /// - `2` for precondition failures (nothing was built)
    /// - `3` for hook failures
    /// - `1` for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            e if e.is_precondition() => 2,
            BuildError::Hook { .. } => 3,
            _ => 1,
        }
    }
}

/// A platform supported by the build dispatcher.
///
/// Names are matched exactly and case-sensitively.
///
/// # Example
///
/// ```
/// use cordova_lib::PlatformName;
///
/// let platform: PlatformName = "android".parse().unwrap();
/// assert_eq!(platform, PlatformName::Android);
/// assert_eq!(platform.as_str(), "android");
/// assert!("Android".parse::<PlatformName>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformName {
    /// Android (script-driven build).
    Android,
    /// iOS (script-driven build).
    Ios,
    /// BlackBerry 10 (ant build against an interactively confirmed device target).
    #[serde(rename = "blackberry")]
    BlackBerry,
}

impl PlatformName {
    /// Every supported platform, in display order.
    pub const ALL: [PlatformName; 3] = [
        PlatformName::Android,
        PlatformName::Ios,
        PlatformName::BlackBerry,
    ];

    /// Returns the string representation of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformName::Android => "android",
            PlatformName::Ios => "ios",
            PlatformName::BlackBerry => "blackberry",
        }
    }
}

impl fmt::Display for PlatformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformName {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlatformName::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| BuildError::UnknownPlatform {
                name: s.to_string(),
                registered: Vec::new(),
            })
    }
}

/// Build profile passed to the platform build scripts.
///
/// # Example
///
/// ```
/// use cordova_lib::BuildProfile;
///
/// assert_eq!(BuildProfile::Debug.as_str(), "debug");
/// assert_eq!(BuildProfile::Release.as_flag(), "--release");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildProfile {
    /// Debug build. The default.
    #[default]
    Debug,
    /// Release build.
    Release,
}

impl BuildProfile {
    /// Returns the string representation of the profile.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "debug",
            BuildProfile::Release => "release",
        }
    }

    /// Flag understood by the generated `cordova/build` scripts.
    pub fn as_flag(&self) -> &'static str {
        match self {
            BuildProfile::Debug => "--debug",
            BuildProfile::Release => "--release",
        }
    }
}

/// What happened to one selected platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PlatformStatus {
    /// Sync and build both succeeded.
    Succeeded,
    /// The build ran and failed. Other platforms were still attempted.
    Failed { detail: String },
    /// The adapter signalled a fatal error; no further platforms were attempted.
    Aborted { detail: String },
    /// Never attempted because an earlier platform aborted the run.
    Skipped,
}

/// Result for a single platform within a build invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformOutcome {
    pub platform: PlatformName,
    #[serde(flatten)]
    pub status: PlatformStatus,
    /// Wall-clock time spent on sync + build.
    pub duration_ms: u64,
}

/// Overall classification of a [`BuildOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every selected platform built.
    Succeeded,
    /// At least one platform failed; none aborted the run.
    PartiallyFailed,
    /// An adapter signalled a fatal error and the run stopped early.
    Aborted,
}

/// Aggregated result of one build invocation, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildOutcome {
    pub platforms: Vec<PlatformOutcome>,
    /// Set when the `after_build` hook failed once platform work had finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_build_error: Option<String>,
}

impl BuildOutcome {
    /// Appends the result for the next platform in selection order.
    pub fn record(&mut self, platform: PlatformName, status: PlatformStatus, duration_ms: u64) {
        self.platforms.push(PlatformOutcome {
            platform,
            status,
            duration_ms,
        });
    }

    /// Classifies the whole invocation.
    pub fn overall(&self) -> OverallStatus {
        let mut failed = false;
        for outcome in &self.platforms {
            match outcome.status {
                PlatformStatus::Aborted { .. } => return OverallStatus::Aborted,
                PlatformStatus::Failed { .. } => failed = true,
                PlatformStatus::Succeeded | PlatformStatus::Skipped => {}
            }
        }
        if failed {
            OverallStatus::PartiallyFailed
        } else {
            OverallStatus::Succeeded
        }
    }

    /// Returns `true` when every selected platform built and `after_build` ran cleanly.
    pub fn is_success(&self) -> bool {
        self.overall() == OverallStatus::Succeeded && self.after_build_error.is_none()
    }

    /// The `after_build` hook failure, as the error the caller should surface.
    pub fn after_build_failure(&self) -> Option<BuildError> {
        self.after_build_error.as_ref().map(|detail| BuildError::Hook {
            event: "after_build".into(),
            detail: detail.clone(),
        })
    }

    /// Platforms whose build succeeded.
    pub fn succeeded(&self) -> impl Iterator<Item = PlatformName> + '_ {
        self.platforms
            .iter()
            .filter(|o| o.status == PlatformStatus::Succeeded)
            .map(|o| o.platform)
    }

    /// Platforms that failed or aborted, with their error detail.
    pub fn failures(&self) -> impl Iterator<Item = (PlatformName, &str)> + '_ {
        self.platforms.iter().filter_map(|o| match &o.status {
            PlatformStatus::Failed { detail } | PlatformStatus::Aborted { detail } => {
                Some((o.platform, detail.as_str()))
            }
            PlatformStatus::Succeeded | PlatformStatus::Skipped => None,
        })
    }

    /// Looks up the outcome of one platform.
    pub fn get(&self, platform: PlatformName) -> Option<&PlatformOutcome> {
        self.platforms.iter().find(|o| o.platform == platform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_names_are_case_sensitive() {
        assert_eq!("ios".parse::<PlatformName>().unwrap(), PlatformName::Ios);
        assert_eq!(
            "blackberry".parse::<PlatformName>().unwrap(),
            PlatformName::BlackBerry
        );
        let err = "IOS".parse::<PlatformName>().unwrap_err();
        assert!(matches!(err, BuildError::UnknownPlatform { ref name, .. } if name == "IOS"));
        assert!("windows".parse::<PlatformName>().is_err());
    }

    #[test]
    fn platform_name_serializes_lowercase() {
        let json = serde_json::to_string(&PlatformName::BlackBerry).unwrap();
        assert_eq!(json, "\"blackberry\"");
    }

    #[test]
    fn exit_codes_separate_preconditions_from_build_failures() {
        let not_project = BuildError::NotACordovaProject {
            cwd: PathBuf::from("/tmp"),
        };
        let failed = BuildError::PlatformBuildFailed {
            platform: PlatformName::Android,
            detail: "exit status 1".into(),
        };
        let hook = BuildError::Hook {
            event: "before_build".into(),
            detail: "exit status 1".into(),
        };
        assert!(not_project.is_precondition());
        assert_eq!(not_project.exit_code(), 2);
        assert!(!failed.is_precondition());
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(hook.exit_code(), 3);
    }

    #[test]
    fn precondition_messages_name_the_directory() {
        let err = BuildError::NotACordovaProject {
            cwd: PathBuf::from("/work/app"),
        };
        assert!(err.to_string().contains("found in /work/app or any parent"));
        let err = BuildError::NoPlatformsAdded {
            root: PathBuf::from("/work/app"),
        };
        assert!(err.to_string().starts_with("no platforms added to the project at /work/app."));
    }

    #[test]
    fn overall_status_reflects_worst_platform() {
        let mut outcome = BuildOutcome::default();
        outcome.record(PlatformName::Android, PlatformStatus::Succeeded, 10);
        assert_eq!(outcome.overall(), OverallStatus::Succeeded);

        outcome.record(
            PlatformName::Ios,
            PlatformStatus::Failed {
                detail: "boom".into(),
            },
            5,
        );
        assert_eq!(outcome.overall(), OverallStatus::PartiallyFailed);
        assert_eq!(outcome.succeeded().collect::<Vec<_>>(), vec![PlatformName::Android]);
        assert_eq!(outcome.failures().count(), 1);

        outcome.record(
            PlatformName::BlackBerry,
            PlatformStatus::Aborted {
                detail: "no target".into(),
            },
            1,
        );
        assert_eq!(outcome.overall(), OverallStatus::Aborted);
        assert!(!outcome.is_success());
    }

    #[test]
    fn outcome_serializes_status_inline() {
        let mut outcome = BuildOutcome::default();
        outcome.record(
            PlatformName::Ios,
            PlatformStatus::Failed {
                detail: "exit status 65".into(),
            },
            42,
        );
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["platforms"][0]["platform"], "ios");
        assert_eq!(value["platforms"][0]["status"], "failed");
        assert_eq!(value["platforms"][0]["detail"], "exit status 65");
        assert_eq!(value["platforms"][0]["duration_ms"], 42);
        assert!(value.get("after_build_error").is_none());
    }

    #[test]
    fn after_build_failure_keeps_platform_status() {
        let mut outcome = BuildOutcome::default();
        outcome.record(PlatformName::Android, PlatformStatus::Succeeded, 10);
        assert!(outcome.after_build_failure().is_none());

        outcome.after_build_error = Some("exit status 1".into());
        assert_eq!(outcome.overall(), OverallStatus::Succeeded);
        assert!(!outcome.is_success());
        let err = outcome.after_build_failure().unwrap();
        assert_eq!(err.to_string(), "after_build hook failed: exit status 1");
        assert_eq!(err.exit_code(), 3);
    }
}
