//! Platform registry
//!
//! Lists the platforms added to a project, in the order they were added, and
//! hands out the [`PlatformAdapter`] for each of them.

use crate::builders::{AndroidAdapter, BlackBerryAdapter, IosAdapter, PlatformAdapter};
use crate::config::{AppConfig, BlackBerryConfig, ProjectConfig};
use crate::project::ProjectContext;
use crate::types::{BuildError, PlatformName};
use std::path::{Path, PathBuf};

/// One added platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformRegistration {
    pub platform: PlatformName,
    /// Absolute path of the native project.
    pub native_path: PathBuf,
}

/// The platforms added to one project.
#[derive(Debug, Clone)]
pub struct PlatformRegistry {
    registrations: Vec<PlatformRegistration>,
    www_dir: PathBuf,
    app: AppConfig,
    blackberry: BlackBerryConfig,
}

impl PlatformRegistry {
    /// Reads the registry from the project's configuration store.
    pub fn load(context: &ProjectContext) -> Result<Self, BuildError> {
        let config = context.load_config()?;
        Ok(Self::from_config(context, &config))
    }

    /// Builds the registry from an already loaded configuration.
    pub fn from_config(context: &ProjectContext, config: &ProjectConfig) -> Self {
        let registrations = config
            .platforms
            .iter()
            .map(|entry| PlatformRegistration {
                platform: entry.name,
                native_path: absolute(context.root(), &entry.relative_path()),
            })
            .collect();
        Self {
            registrations,
            www_dir: context.www_dir(),
            app: config.app.clone(),
            blackberry: config.blackberry.clone(),
        }
    }

    /// Registered platforms in registration order.
    pub fn list_registered(&self) -> &[PlatformRegistration] {
        &self.registrations
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn contains(&self, platform: PlatformName) -> bool {
        self.registration(platform).is_some()
    }

    pub fn registration(&self, platform: PlatformName) -> Option<&PlatformRegistration> {
        self.registrations.iter().find(|r| r.platform == platform)
    }

    /// Registered platform names, for error messages.
    pub fn names(&self) -> Vec<String> {
        self.registrations
            .iter()
            .map(|r| r.platform.to_string())
            .collect()
    }

    /// Resolves a caller-supplied name to a registered platform.
    ///
    /// The match is exact and case-sensitive; anything else is
    /// [`BuildError::UnknownPlatform`].
    pub fn lookup(&self, name: &str) -> Result<PlatformName, BuildError> {
        let unknown = || BuildError::UnknownPlatform {
            name: name.to_string(),
            registered: self.names(),
        };
        let platform: PlatformName = name.parse().map_err(|_| unknown())?;
        if !self.contains(platform) {
            return Err(unknown());
        }
        Ok(platform)
    }

    /// Returns the adapter for a registered platform.
    pub fn get_adapter(&self, platform: PlatformName) -> Result<PlatformAdapter, BuildError> {
        let registration =
            self.registration(platform)
                .ok_or_else(|| BuildError::UnknownPlatform {
                    name: platform.to_string(),
                    registered: self.names(),
                })?;
        let native = registration.native_path.clone();
        let www = self.www_dir.clone();
        let app = self.app.clone();
        Ok(match platform {
            PlatformName::Android => PlatformAdapter::Android(AndroidAdapter::new(native, www, app)),
            PlatformName::Ios => PlatformAdapter::Ios(IosAdapter::new(native, www, app)),
            PlatformName::BlackBerry => PlatformAdapter::BlackBerry(BlackBerryAdapter::new(
                native,
                www,
                app,
                self.blackberry.clone(),
            )),
        })
    }
}

fn absolute(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}
