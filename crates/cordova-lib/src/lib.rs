//! Build dispatch for cross-platform mobile projects
//!
//! `cordova-lib` builds the native platforms (Android, iOS, BlackBerry 10) that
//! were added to a project, wrapping the whole run in `before_build` /
//! `after_build` lifecycle hooks.
//!
//! # Quick Start
//!
//! ```ignore
//! use cordova_lib::{BuildDispatcher, BuildRequest, ScriptHooks, SystemRunner};
//!
//! fn main() -> Result<(), cordova_lib::BuildError> {
//!     let hooks = ScriptHooks::new();
//!     let dispatcher = BuildDispatcher::new(&hooks, &SystemRunner);
//!
//!     // Every registered platform, in the order they were added
//!     let outcome = dispatcher.build(&BuildRequest::new("."))?;
//!
//!     // Or a subset, in the given order
//!     let outcome = dispatcher.build(&BuildRequest::new(".").platforms(vec![
//!         "ios".to_string(),
//!         "android".to_string(),
//!     ]))?;
//!
//!     for (platform, detail) in outcome.failures() {
//!         eprintln!("{platform}: {detail}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Project**: finds the project root from a working directory
//! - **Registry**: platforms added to the project, and their adapters
//! - **Selection**: turns caller input into a validated platform list
//! - **Hooks**: the lifecycle event contract and the script-directory runner
//! - **Dispatch**: the build engine tying everything together
//! - **Builders**: per-platform sync and build adapters
//! - **Codegen**: project creation and platform scaffolding

pub mod builders;
pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod hooks;
pub mod project;
pub mod registry;
pub mod selection;
pub mod types;

pub use builders::{
    BuildCommand, CommandOutput, CommandRunner, DryRunRunner, NamedTargetResolver,
    PlatformAdapter, PlatformBuildAdapter, PromptTargetResolver, SystemRunner, TargetResolver,
};
pub use config::{AppConfig, BlackBerryConfig, DeviceTarget, PlatformEntry, ProjectConfig, TargetKind};
pub use dispatch::{BuildDispatcher, BuildRequest};
pub use hooks::{HookEvent, HookNotifier, ScriptHooks};
pub use project::ProjectContext;
pub use registry::{PlatformRegistration, PlatformRegistry};
pub use selection::{PlatformSelection, PlatformSelectionInput};
pub use types::{
    BuildError, BuildOutcome, BuildProfile, OverallStatus, PlatformName, PlatformOutcome,
    PlatformStatus,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn every_platform_has_an_adapter() {
        let mut config = ProjectConfig::default();
        for platform in PlatformName::ALL {
            config.add_platform(PlatformEntry::new(platform)).unwrap();
        }
        let registry =
            PlatformRegistry::from_config(&ProjectContext::at_root(std::path::Path::new("/p")), &config);
        for platform in PlatformName::ALL {
            assert_eq!(registry.get_adapter(platform).unwrap().platform(), platform);
        }
    }
}
