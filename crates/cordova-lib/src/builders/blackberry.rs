//! BlackBerry 10 build adapter
//!
//! Unlike the script-driven platforms, a BlackBerry build deploys as it builds:
//! the device or simulator target is confirmed first, then `ant` runs the
//! project's `build.xml` with the `qnx load-device` (or `load-simulator`) targets.

use super::common::{
    BuildCommand, check_sync_inputs, replace_dir, run_build_command, sync_failed,
    write_generated, xml_escape,
};
use super::{BuildEnv, PlatformBuildAdapter};
use crate::config::{AppConfig, BlackBerryConfig, DeviceTarget, TargetKind};
use crate::types::{BuildError, PlatformName};
use std::path::{Path, PathBuf};

/// BlackBerry adapter for one registered native project.
#[derive(Debug, Clone)]
pub struct BlackBerryAdapter {
    native_dir: PathBuf,
    www_dir: PathBuf,
    app: AppConfig,
    settings: BlackBerryConfig,
}

impl BlackBerryAdapter {
    /// Creates a new BlackBerry adapter
    pub fn new(
        native_dir: impl Into<PathBuf>,
        www_dir: impl Into<PathBuf>,
        app: AppConfig,
        settings: BlackBerryConfig,
    ) -> Self {
        Self {
            native_dir: native_dir.into(),
            www_dir: www_dir.into(),
            app,
            settings,
        }
    }

    pub fn native_dir(&self) -> &Path {
        &self.native_dir
    }

    pub fn build_file(&self) -> PathBuf {
        self.native_dir.join("build.xml")
    }

    pub fn native_www_dir(&self) -> PathBuf {
        self.native_dir.join("www")
    }

    /// Generated widget configuration read by the packager.
    pub fn widget_config_path(&self) -> PathBuf {
        self.native_dir.join("config.xml")
    }

    /// Constructs the `ant` invocation for a resolved target.
    pub fn build_command(&self, target: &DeviceTarget) -> BuildCommand {
        let load = match target.kind {
            TargetKind::Device => "load-device",
            TargetKind::Simulator => "load-simulator",
        };
        let mut cmd = BuildCommand::new("ant", &self.native_dir)
            .arg("-f")
            .arg(self.build_file())
            .arg("qnx")
            .arg(load)
            .arg(format!("-Dqnx.device.target={}", target.name))
            .arg(format!("-Dqnx.device.ip={}", target.ip));
        if let Some(password) = &target.password {
            cmd = cmd.secret_arg(format!("-Dqnx.device.password={}", password));
        }
        cmd
    }

    fn render_widget_config(&self) -> String {
        let description = if self.app.description.is_empty() {
            String::new()
        } else {
            format!(
                "    <description>{}</description>\n",
                xml_escape(&self.app.description)
            )
        };
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<widget xmlns="http://www.w3.org/ns/widgets" id="{}" version="{}">
    <name>{}</name>
{}    <content src="index.html" />
</widget>
"#,
            xml_escape(&self.app.id),
            xml_escape(&self.app.version),
            xml_escape(&self.app.name),
            description
        )
    }
}

impl PlatformBuildAdapter for BlackBerryAdapter {
    fn platform(&self) -> PlatformName {
        PlatformName::BlackBerry
    }

    fn sync_project(&self) -> Result<(), BuildError> {
        let platform = self.platform();
        check_sync_inputs(platform, &self.native_dir, &self.www_dir)?;

        replace_dir(&self.www_dir, &self.native_www_dir())
            .map_err(|e| sync_failed(platform, "copy www into the native project", e))?;
        write_generated(&self.widget_config_path(), &self.render_widget_config())
            .map_err(|e| sync_failed(platform, "write config.xml", e))?;

        tracing::debug!(%platform, native_dir = %self.native_dir.display(), "project synced");
        Ok(())
    }

    fn invoke_build(&self, env: &BuildEnv<'_>) -> Result<(), BuildError> {
        let target = env.targets.resolve(&self.settings)?;
        tracing::info!(target = %target.name, ip = %target.ip, "device target confirmed");
        run_build_command(env.runner, self.platform(), &self.build_command(&target))
    }
}
