//! Android build adapter
//!
//! Syncs the shared app config into `platforms/android` and runs the project's
//! own `cordova/build` script, which wraps Ant.

use super::common::{
    BuildCommand, check_sync_inputs, replace_dir, run_build_command, sync_failed,
    write_generated, xml_escape,
};
use super::{BuildEnv, PlatformBuildAdapter};
use crate::config::AppConfig;
use crate::types::{BuildError, BuildProfile, PlatformName};
use std::path::{Path, PathBuf};

/// Android adapter for one registered native project.
#[derive(Debug, Clone)]
pub struct AndroidAdapter {
    /// Native project directory (e.g., `platforms/android`)
    native_dir: PathBuf,
    /// Shared `www/` directory of the project
    www_dir: PathBuf,
    app: AppConfig,
}

impl AndroidAdapter {
    /// Creates a new Android adapter
    ///
    /// # Arguments
    ///
    /// * `native_dir` - Absolute path of the Android native project
    /// * `www_dir` - Absolute path of the project's shared web assets
    /// * `app` - Shared app metadata to apply on sync
    pub fn new(native_dir: impl Into<PathBuf>, www_dir: impl Into<PathBuf>, app: AppConfig) -> Self {
        Self {
            native_dir: native_dir.into(),
            www_dir: www_dir.into(),
            app,
        }
    }

    pub fn native_dir(&self) -> &Path {
        &self.native_dir
    }

    /// Web assets inside the native project.
    pub fn assets_www_dir(&self) -> PathBuf {
        self.native_dir.join("assets").join("www")
    }

    /// Generated string resources.
    pub fn strings_path(&self) -> PathBuf {
        self.native_dir.join("res").join("values").join("strings.xml")
    }

    /// Constructs the `cordova/build` invocation.
    pub fn build_command(&self, profile: BuildProfile) -> BuildCommand {
        BuildCommand::new(build_script(&self.native_dir), &self.native_dir).arg(profile.as_flag())
    }

    fn render_strings(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<resources>
    <string name="app_name">{}</string>
    <string name="app_id">{}</string>
    <string name="app_version">{}</string>
</resources>
"#,
            xml_escape(&self.app.name),
            xml_escape(&self.app.id),
            xml_escape(&self.app.version)
        )
    }
}

impl PlatformBuildAdapter for AndroidAdapter {
    fn platform(&self) -> PlatformName {
        PlatformName::Android
    }

    fn sync_project(&self) -> Result<(), BuildError> {
        let platform = self.platform();
        check_sync_inputs(platform, &self.native_dir, &self.www_dir)?;

        replace_dir(&self.www_dir, &self.assets_www_dir())
            .map_err(|e| sync_failed(platform, "copy www into assets/www", e))?;
        write_generated(&self.strings_path(), &self.render_strings())
            .map_err(|e| sync_failed(platform, "write res/values/strings.xml", e))?;

        tracing::debug!(%platform, native_dir = %self.native_dir.display(), "project synced");
        Ok(())
    }

    fn invoke_build(&self, env: &BuildEnv<'_>) -> Result<(), BuildError> {
        run_build_command(env.runner, self.platform(), &self.build_command(env.profile))
    }
}

/// Path of the per-platform build script under a native project.
pub(crate) fn build_script(native_dir: &Path) -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "build.bat"
    } else {
        "build"
    };
    native_dir.join("cordova").join(name)
}
