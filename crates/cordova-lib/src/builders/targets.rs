//! Device-target resolution for platforms that deploy while building.
//!
//! BlackBerry builds need a device or simulator before the build command can be
//! constructed. [`PromptTargetResolver`] asks the operator; [`NamedTargetResolver`]
//! picks a configured target by name for unattended runs.

use crate::config::{BlackBerryConfig, DeviceTarget, TargetKind};
use crate::types::{BuildError, PlatformName};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use std::io::IsTerminal;

/// Chooses the device target for a build.
pub trait TargetResolver {
    /// Returns the confirmed target.
    ///
    /// Errors are [`BuildError::AdapterFatal`]: without a target the build
    /// cannot be constructed at all.
    fn resolve(&self, config: &BlackBerryConfig) -> Result<DeviceTarget, BuildError>;
}

/// Asks the operator on the terminal.
///
/// - With a `default_target`, asks to confirm it.
/// - Otherwise, or when declined, offers a selection of configured targets.
/// - With no configured targets, asks for the device IP and password.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTargetResolver;

impl TargetResolver for PromptTargetResolver {
    fn resolve(&self, config: &BlackBerryConfig) -> Result<DeviceTarget, BuildError> {
        if !std::io::stdin().is_terminal() {
            return Err(fatal(
                "a device target must be confirmed interactively, but stdin is not a terminal. \
                 Pass --device-target <name> to pick a target from .cordova/config.toml",
            ));
        }
        let theme = ColorfulTheme::default();

        if let Some(default) = config
            .default_target
            .as_deref()
            .and_then(|name| config.target(name))
        {
            let confirmed = Confirm::with_theme(&theme)
                .with_prompt(format!("Deploy to {} ({})?", default.name, default.ip))
                .default(true)
                .interact()
                .map_err(prompt_failed)?;
            if confirmed {
                return Ok(default.clone());
            }
        }

        if !config.targets.is_empty() {
            let items: Vec<String> = config
                .targets
                .iter()
                .map(|t| format!("{} ({}, {})", t.name, t.ip, kind_label(t.kind)))
                .collect();
            let index = Select::with_theme(&theme)
                .with_prompt("Select a BlackBerry target")
                .items(&items)
                .default(0)
                .interact_opt()
                .map_err(prompt_failed)?
                .ok_or_else(|| fatal("device target selection was cancelled"))?;
            return Ok(config.targets[index].clone());
        }

        let ip = Input::<String>::with_theme(&theme)
            .with_prompt("BlackBerry device IP")
            .interact_text()
            .map_err(prompt_failed)?;
        let password = Password::with_theme(&theme)
            .with_prompt("Device password (empty for none)")
            .allow_empty_password(true)
            .interact()
            .map_err(prompt_failed)?;
        Ok(DeviceTarget {
            name: "device".to_string(),
            ip: ip.trim().to_string(),
            password: (!password.is_empty()).then_some(password),
            kind: TargetKind::Device,
        })
    }
}

/// Picks a configured target by name without prompting.
#[derive(Debug, Clone)]
pub struct NamedTargetResolver {
    name: String,
}

impl NamedTargetResolver {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TargetResolver for NamedTargetResolver {
    fn resolve(&self, config: &BlackBerryConfig) -> Result<DeviceTarget, BuildError> {
        config.target(&self.name).cloned().ok_or_else(|| {
            let known: Vec<&str> = config.targets.iter().map(|t| t.name.as_str()).collect();
            fatal(&format!(
                "device target '{}' is not configured. Known targets: {:?}",
                self.name, known
            ))
        })
    }
}

fn kind_label(kind: TargetKind) -> &'static str {
    match kind {
        TargetKind::Device => "device",
        TargetKind::Simulator => "simulator",
    }
}

fn fatal(detail: &str) -> BuildError {
    BuildError::AdapterFatal {
        platform: PlatformName::BlackBerry,
        detail: detail.to_string(),
    }
}

fn prompt_failed(err: dialoguer::Error) -> BuildError {
    fatal(&format!("device target prompt failed: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> BlackBerryConfig {
        BlackBerryConfig {
            default_target: None,
            targets: vec![
                DeviceTarget {
                    name: "q10".into(),
                    ip: "169.254.0.1".into(),
                    password: Some("pw".into()),
                    kind: TargetKind::Device,
                },
                DeviceTarget {
                    name: "sim".into(),
                    ip: "192.168.56.101".into(),
                    password: None,
                    kind: TargetKind::Simulator,
                },
            ],
        }
    }

    #[test]
    fn named_resolver_finds_target() {
        let target = NamedTargetResolver::new("sim").resolve(&config()).unwrap();
        assert_eq!(target.ip, "192.168.56.101");
        assert_eq!(target.kind, TargetKind::Simulator);
    }

    #[test]
    fn named_resolver_unknown_target_is_fatal() {
        let err = NamedTargetResolver::new("z10").resolve(&config()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::AdapterFatal {
                platform: PlatformName::BlackBerry,
                ..
            }
        ));
        assert!(err.to_string().contains("q10"));
    }
}
