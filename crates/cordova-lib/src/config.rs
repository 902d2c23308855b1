//! Project configuration store.
//!
//! Every project keeps its persistent settings in `.cordova/config.toml`:
//! the shared app metadata that is pushed into each native project on sync,
//! the ordered list of added platforms, and per-platform settings.
//!
//! ## Example Configuration
//!
//! ```toml
//! [app]
//! id = "io.cordova.hello"
//! name = "HelloCordova"
//! version = "0.0.1"
//!
//! [[platforms]]
//! name = "android"
//!
//! [[platforms]]
//! name = "ios"
//! path = "platforms/ios"
//!
//! [blackberry]
//! default_target = "dev-phone"
//!
//! [[blackberry.targets]]
//! name = "dev-phone"
//! ip = "169.254.0.1"
//! password = "secret"
//! ```

use crate::types::{BuildError, PlatformName};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the marker directory at the project root.
pub const PROJECT_DIR_NAME: &str = ".cordova";

/// The configuration file name inside [`PROJECT_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration structure for `.cordova/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Shared app metadata.
    pub app: AppConfig,

    /// Added platforms, in the order they were added.
    pub platforms: Vec<PlatformEntry>,

    /// BlackBerry device targets.
    pub blackberry: BlackBerryConfig,
}

/// Shared app metadata applied to every native project on sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Reverse-domain app identifier (e.g., "io.cordova.hello").
    pub id: String,

    /// Human-readable app name.
    pub name: String,

    /// App version string.
    pub version: String,

    /// Optional one-line description.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "io.cordova.hellocordova".to_string(),
            name: "HelloCordova".to_string(),
            version: "0.0.1".to_string(),
            description: String::new(),
        }
    }
}

/// One `[[platforms]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    pub name: PlatformName,

    /// Native project directory, relative to the project root.
    ///
    /// Defaults to `platforms/<name>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl PlatformEntry {
    /// Entry with the default native project location.
    pub fn new(name: PlatformName) -> Self {
        Self { name, path: None }
    }

    /// Native project directory relative to the project root.
    pub fn relative_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| Path::new("platforms").join(self.name.as_str()))
    }
}

/// BlackBerry-specific configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlackBerryConfig {
    /// Target to offer first when prompting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_target: Option<String>,

    /// Known devices and simulators.
    pub targets: Vec<DeviceTarget>,
}

impl BlackBerryConfig {
    /// Finds a configured target by name.
    pub fn target(&self, name: &str) -> Option<&DeviceTarget> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// A device or simulator that a build can be deployed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceTarget {
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub kind: TargetKind,
}

/// Whether a [`DeviceTarget`] is hardware or a simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Device,
    Simulator,
}

impl ProjectConfig {
    /// Creates a new configuration for the given app, with no platforms.
    pub fn new(app: AppConfig) -> Self {
        Self {
            app,
            ..Self::default()
        }
    }

    /// Path of the configuration file for a project rooted at `root`.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(PROJECT_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Loads configuration from the specified file path.
    ///
    /// A missing file yields the default configuration: a bare `.cordova/`
    /// directory is still a project, just one with no platforms.
    pub fn load_from_file(path: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: ProjectConfig = toml::from_str(&contents).map_err(|e| {
            BuildError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to the specified file path.
    pub fn save_to_file(&self, path: &Path) -> Result<(), BuildError> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BuildError::Config(format!("failed to serialize configuration: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Looks up the registration of a platform.
    pub fn platform(&self, name: PlatformName) -> Option<&PlatformEntry> {
        self.platforms.iter().find(|p| p.name == name)
    }

    /// Appends a platform registration, keeping earlier entries in place.
    pub fn add_platform(&mut self, entry: PlatformEntry) -> Result<(), BuildError> {
        if self.platform(entry.name).is_some() {
            return Err(BuildError::PlatformAlreadyAdded(entry.name.to_string()));
        }
        self.platforms.push(entry);
        Ok(())
    }

    /// Removes a platform registration, returning it.
    pub fn remove_platform(&mut self, name: PlatformName) -> Option<PlatformEntry> {
        let index = self.platforms.iter().position(|p| p.name == name)?;
        Some(self.platforms.remove(index))
    }

    fn validate(&self) -> Result<(), BuildError> {
        for (i, entry) in self.platforms.iter().enumerate() {
            if self.platforms[..i].iter().any(|p| p.name == entry.name) {
                return Err(BuildError::Config(format!(
                    "platform '{}' is listed more than once",
                    entry.name
                )));
            }
        }
        if let Some(default) = &self.blackberry.default_target
            && self.blackberry.target(default).is_none()
        {
            return Err(BuildError::Config(format!(
                "blackberry.default_target '{}' does not match any [[blackberry.targets]] entry",
                default
            )));
        }
        Ok(())
    }
}
