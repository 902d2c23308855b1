//! Project context resolution.
//!
//! A directory belongs to a project when it, or one of its ancestors, contains
//! a `.cordova/` directory. Not finding one is an ordinary outcome, reported as
//! `None` rather than an error.

use crate::config::{PROJECT_DIR_NAME, ProjectConfig};
use std::path::{Path, PathBuf};

/// Identifies the project a command operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectContext {
    root: PathBuf,
    config_path: PathBuf,
}

impl ProjectContext {
    /// Walks from `start` toward the filesystem root looking for the project marker.
    ///
    /// A relative `start` is taken relative to the process working directory.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use cordova_lib::ProjectContext;
    ///
    /// match ProjectContext::resolve(&std::env::current_dir()?) {
    ///     Some(ctx) => println!("project root: {}", ctx.root().display()),
    ///     None => println!("not inside a project"),
    /// }
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn resolve(start: &Path) -> Option<Self> {
        match std::env::current_dir() {
            Ok(cwd) => Self::resolve_from(&cwd, start),
            Err(_) => Self::resolve_from(Path::new(""), start),
        }
    }

    /// Like [`ProjectContext::resolve`], with relative paths taken from `base`.
    pub(crate) fn resolve_from(base: &Path, start: &Path) -> Option<Self> {
        let joined = base.join(start);
        let start = std::path::absolute(&joined).unwrap_or(joined);
        start
            .ancestors()
            .find(|candidate| is_project_root(candidate))
            .map(Self::at_root)
    }

    /// Context for a directory already known to be a project root.
    pub fn at_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            config_path: ProjectConfig::path_for(root),
        }
    }

    /// Project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the configuration store.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Shared web assets pushed into every native project.
    pub fn www_dir(&self) -> PathBuf {
        self.root.join("www")
    }

    /// Directory holding the per-event hook script directories.
    pub fn hooks_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR_NAME).join("hooks")
    }

    /// Reads the configuration store.
    pub fn load_config(&self) -> Result<ProjectConfig, crate::BuildError> {
        ProjectConfig::load_from_file(&self.config_path)
    }
}

fn is_project_root(candidate: &Path) -> bool {
    candidate.join(PROJECT_DIR_NAME).is_dir()
}
