//! Platform build adapters.
//!
//! Every platform implements the same two-step contract, [`PlatformBuildAdapter`]:
//!
//! 1. **`sync_project`** - re-apply the project's shared configuration (`www/`
//!    assets and app metadata) onto the native project. Always runs, and running
//!    it twice leaves the native project exactly as running it once.
//! 2. **`invoke_build`** - construct the platform's external build command and
//!    run it. Exit status zero is success.
//!
//! ## Adapters
//!
//! | Adapter | Platform | Build command |
//! |---------|----------|---------------|
//! | [`AndroidAdapter`] | Android | `<native>/cordova/build --debug\|--release` |
//! | [`IosAdapter`] | iOS | `<native>/cordova/build --debug\|--release` |
//! | [`BlackBerryAdapter`] | BlackBerry 10 | `ant -f <native>/build.xml qnx load-device ...` after a device target is confirmed |
//!
//! [`PlatformAdapter`] is the tagged union the registry hands out; it picks the
//! variant from the platform name.
//!
//! ## Error classification
//!
//! - A build that runs and exits non-zero (or cannot be started) returns
//!   [`BuildError::PlatformBuildFailed`]. The dispatcher records it and moves on.
//! - Anything else, such as a broken native project during sync or an abandoned
//!   target prompt, is fatal and stops the remaining platforms.

pub mod android;
pub mod blackberry;
pub mod common;
pub mod ios;
pub mod targets;

pub use android::AndroidAdapter;
pub use blackberry::BlackBerryAdapter;
pub use common::{BuildCommand, CommandOutput, CommandRunner, DryRunRunner, SystemRunner};
pub use ios::IosAdapter;
pub use targets::{NamedTargetResolver, PromptTargetResolver, TargetResolver};

use crate::types::{BuildError, BuildProfile, PlatformName};

/// Collaborators an adapter needs to run a build.
#[derive(Clone, Copy)]
pub struct BuildEnv<'a> {
    pub runner: &'a dyn CommandRunner,
    pub targets: &'a dyn TargetResolver,
    pub profile: BuildProfile,
}

/// The per-platform capability set used by the dispatcher.
pub trait PlatformBuildAdapter {
    fn platform(&self) -> PlatformName;

    /// Pushes the shared configuration into the native project. Idempotent.
    fn sync_project(&self) -> Result<(), BuildError>;

    /// Runs the platform's external build.
    fn invoke_build(&self, env: &BuildEnv<'_>) -> Result<(), BuildError>;
}

/// Adapter selected by platform name.
#[derive(Debug, Clone)]
pub enum PlatformAdapter {
    Android(AndroidAdapter),
    Ios(IosAdapter),
    BlackBerry(BlackBerryAdapter),
}

impl PlatformAdapter {
    fn inner(&self) -> &dyn PlatformBuildAdapter {
        match self {
            PlatformAdapter::Android(a) => a,
            PlatformAdapter::Ios(a) => a,
            PlatformAdapter::BlackBerry(a) => a,
        }
    }
}

impl PlatformBuildAdapter for PlatformAdapter {
    fn platform(&self) -> PlatformName {
        self.inner().platform()
    }

    fn sync_project(&self) -> Result<(), BuildError> {
        self.inner().sync_project()
    }

    fn invoke_build(&self, env: &BuildEnv<'_>) -> Result<(), BuildError> {
        self.inner().invoke_build(env)
    }
}
