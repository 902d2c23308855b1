//! Project scaffolding
//!
//! Creates new projects and adds or removes native platform projects, using
//! templates embedded at compile time. Templates end in `.template` and use
//! `{{VAR}}` placeholders; the suffix is dropped when the file is written.

use crate::builders::common::xml_escape;
use crate::config::{AppConfig, PROJECT_DIR_NAME, PlatformEntry, ProjectConfig};
use crate::project::ProjectContext;
use crate::types::{BuildError, PlatformName};
use include_dir::{Dir, DirEntry, include_dir};
use std::fs;
use std::path::{Path, PathBuf};

static WWW_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/www");
static ANDROID_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/android");
static IOS_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/ios");
static BLACKBERRY_TEMPLATES: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/templates/blackberry");

/// Hook event directories created with every project.
const HOOK_DIRS: &[&str] = &["before_build", "after_build"];

/// Template variable
struct TemplateVar {
    name: &'static str,
    value: String,
}

/// Creates a new project in `dir`.
///
/// # Layout
///
/// ```text
/// dir/
/// ├── .cordova/
/// │   ├── config.toml
/// │   └── hooks/{before_build,after_build}/
/// ├── platforms/
/// └── www/index.html
/// ```
pub fn create_project(dir: &Path, app: AppConfig) -> Result<ProjectContext, BuildError> {
    if dir.join(PROJECT_DIR_NAME).exists() {
        return Err(BuildError::Config(format!(
            "{} already contains a project",
            dir.display()
        )));
    }

    let context = ProjectContext::at_root(dir);
    for event in HOOK_DIRS {
        fs::create_dir_all(context.hooks_dir().join(event))?;
    }
    fs::create_dir_all(dir.join("platforms"))?;
    if !context.www_dir().exists() {
        render_dir(&WWW_TEMPLATES, &context.www_dir(), &template_vars(&app))?;
    }
    ProjectConfig::new(app).save_to_file(context.config_path())?;

    tracing::info!(root = %dir.display(), "created project");
    Ok(context)
}

/// Adds `platform` to the project and returns the native project directory.
pub fn add_platform(context: &ProjectContext, platform: PlatformName) -> Result<PathBuf, BuildError> {
    let mut config = context.load_config()?;
    if config.platform(platform).is_some() {
        return Err(BuildError::PlatformAlreadyAdded(platform.to_string()));
    }

    let entry = PlatformEntry::new(platform);
    let native_dir = context.root().join(entry.relative_path());
    render_dir(templates_for(platform), &native_dir, &template_vars(&config.app))?;

    config.add_platform(entry)?;
    config.save_to_file(context.config_path())?;

    tracing::info!(%platform, native_dir = %native_dir.display(), "platform added");
    Ok(native_dir)
}

/// Removes `platform` from the project and deletes its native project.
pub fn remove_platform(context: &ProjectContext, platform: PlatformName) -> Result<(), BuildError> {
    let mut config = context.load_config()?;
    let entry = config
        .remove_platform(platform)
        .ok_or_else(|| BuildError::UnknownPlatform {
            name: platform.to_string(),
            registered: config.platforms.iter().map(|p| p.name.to_string()).collect(),
        })?;

    let native_dir = context.root().join(entry.relative_path());
    if native_dir.exists() {
        fs::remove_dir_all(&native_dir)?;
    }
    config.save_to_file(context.config_path())?;

    tracing::info!(%platform, "platform removed");
    Ok(())
}

/// Default reverse-domain app id for a project directory name.
///
/// - "hello-world" -> "io.cordova.helloworld"
/// - "My App" -> "io.cordova.myapp"
pub fn default_app_id(project_name: &str) -> String {
    let component = sanitize_id_component(project_name);
    if component.is_empty() {
        AppConfig::default().id
    } else {
        format!("io.cordova.{}", component)
    }
}

fn sanitize_id_component(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn templates_for(platform: PlatformName) -> &'static Dir<'static> {
    match platform {
        PlatformName::Android => &ANDROID_TEMPLATES,
        PlatformName::Ios => &IOS_TEMPLATES,
        PlatformName::BlackBerry => &BLACKBERRY_TEMPLATES,
    }
}

fn template_vars(app: &AppConfig) -> Vec<TemplateVar> {
    let project_name = match sanitize_id_component(&app.name) {
        name if name.is_empty() => "cordovaapp".to_string(),
        name => name,
    };
    vec![
        TemplateVar {
            name: "APP_ID",
            value: app.id.clone(),
        },
        TemplateVar {
            name: "APP_NAME",
            value: app.name.clone(),
        },
        TemplateVar {
            name: "APP_VERSION",
            value: app.version.clone(),
        },
        TemplateVar {
            name: "PROJECT_NAME",
            value: project_name,
        },
    ]
}

fn render_dir(dir: &Dir, out_root: &Path, vars: &[TemplateVar]) -> Result<(), BuildError> {
    for entry in dir.entries() {
        match entry {
            DirEntry::Dir(sub) => render_dir(sub, out_root, vars)?,
            DirEntry::File(file) => {
                // path() is relative to the embedded root
                let mut relative = file.path().to_path_buf();
                let mut contents = file.contents().to_vec();

                if relative.extension().is_some_and(|ext| ext == "template") {
                    relative.set_extension("");
                    if let Ok(text) = std::str::from_utf8(&contents) {
                        let rendered = render_template(text, vars, is_markup(&relative));
                        validate_no_unreplaced_placeholders(&rendered, &relative)?;
                        contents = rendered.into_bytes();
                    }
                }

                let out_path = out_root.join(&relative);
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&out_path, &contents)?;
                if contents.starts_with(b"#!") {
                    make_executable(&out_path)?;
                }
            }
        }
    }
    Ok(())
}

fn is_markup(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext, "xml" | "html" | "plist"))
}

fn render_template(input: &str, vars: &[TemplateVar], escape: bool) -> String {
    let mut output = input.to_string();
    for var in vars {
        // values land in script comments and XML text, neither of which may span lines
        let value: String = var.value.chars().filter(|c| !c.is_control()).collect();
        let value = if escape { xml_escape(&value) } else { value };
        output = output.replace(&format!("{{{{{}}}}}", var.name), &value);
    }
    output
}

/// Fails if any `{{NAME}}` placeholder survived rendering.
fn validate_no_unreplaced_placeholders(content: &str, file_path: &Path) -> Result<(), BuildError> {
    let mut pos = 0;
    let mut unreplaced = Vec::new();

    while let Some(start) = content[pos..].find("{{") {
        let abs_start = pos + start;
        let Some(end) = content[abs_start..].find("}}") else {
            break;
        };
        let var_name = &content[abs_start + 2..abs_start + end];
        if !var_name.is_empty() && !var_name.contains(['$', ' ']) {
            unreplaced.push(content[abs_start..abs_start + end + 2].to_string());
        }
        pos = abs_start + end + 2;
    }

    if !unreplaced.is_empty() {
        return Err(BuildError::Config(format!(
            "template {:?} has unreplaced placeholders: {:?}",
            file_path, unreplaced
        )));
    }
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
