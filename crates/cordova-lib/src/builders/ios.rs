//! iOS build adapter
//!
//! Syncs the shared app config into `platforms/ios` (web assets plus a
//! generated Info.plist fragment) and runs the project's `cordova/build`
//! script, which drives xcodebuild.

use super::android::build_script;
use super::common::{
    BuildCommand, check_sync_inputs, replace_dir, run_build_command, sync_failed,
    write_generated, xml_escape,
};
use super::{BuildEnv, PlatformBuildAdapter};
use crate::config::AppConfig;
use crate::types::{BuildError, BuildProfile, PlatformName};
use std::path::{Path, PathBuf};

/// File name of the generated property list.
const INFO_PLIST_NAME: &str = "CordovaApp-Info.plist";

/// iOS adapter for one registered native project.
#[derive(Debug, Clone)]
pub struct IosAdapter {
    native_dir: PathBuf,
    www_dir: PathBuf,
    app: AppConfig,
}

impl IosAdapter {
    /// Creates a new iOS adapter
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
    pub fn native_www_dir(&self) -> PathBuf {
        self.native_dir.join("www")
    }

    pub fn info_plist_path(&self) -> PathBuf {
        self.native_dir.join(INFO_PLIST_NAME)
    }

    /// Constructs the `cordova/build` invocation.
    pub fn build_command(&self, profile: BuildProfile) -> BuildCommand {
        BuildCommand::new(build_script(&self.native_dir), &self.native_dir).arg(profile.as_flag())
    }

    fn render_info_plist(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleDisplayName</key>
    <string>{}</string>
    <key>CFBundleIdentifier</key>
    <string>{}</string>
    <key>CFBundleShortVersionString</key>
    <string>{}</string>
    <key>CFBundleVersion</key>
    <string>{}</string>
</dict>
</plist>
"#,
            xml_escape(&self.app.name),
            xml_escape(&self.app.id),
            xml_escape(&self.app.version),
            xml_escape(&self.app.version)
        )
    }
}

impl PlatformBuildAdapter for IosAdapter {
    fn platform(&self) -> PlatformName {
        PlatformName::Ios
    }

    fn sync_project(&self) -> Result<(), BuildError> {
        let platform = self.platform();
        check_sync_inputs(platform, &self.native_dir, &self.www_dir)?;

        replace_dir(&self.www_dir, &self.native_www_dir())
            .map_err(|e| sync_failed(platform, "copy www into the Xcode project", e))?;
        write_generated(&self.info_plist_path(), &self.render_info_plist())
            .map_err(|e| sync_failed(platform, "write the Info.plist", e))?;

        tracing::debug!(%platform, native_dir = %self.native_dir.display(), "project synced");
        Ok(())
    }

    fn invoke_build(&self, env: &BuildEnv<'_>) -> Result<(), BuildError> {
        run_build_command(env.runner, self.platform(), &self.build_command(env.profile))
    }
}
