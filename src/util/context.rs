//! Global context for capforge operations.
//!
//! Provides centralized access to paths and the merged user configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::manifest::MANIFEST_NAME;
use crate::util::config::{self, Config};

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global capforge data (~/.capforge/)
    home: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext rooted at the current directory.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            home: config::global_config_dir(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the capforge home directory (~/.capforge/), if a home exists.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Load the user configuration for a project, project file over global file.
    pub fn load_config(&self, project_root: &Path) -> Config {
        config::load_config(
            self.config_path().as_deref(),
            &config::project_config_path(project_root),
        )
    }

    /// Find Matrix.toml starting from cwd and searching upward.
    pub fn find_manifest(&self) -> MatrixResult<PathBuf> {
        let mut current = self.cwd.clone();
        loop {
            let candidate = current.join(MANIFEST_NAME);
            if candidate.is_file() {
                return Ok(candidate);
            }
            if !current.pop() {
                return Err(MatrixError::manifest(
                    self.cwd.join(MANIFEST_NAME),
                    format!(
                        "could not find `{}` in `{}` or any parent directory",
                        MANIFEST_NAME,
                        self.cwd.display()
                    ),
                ));
            }
        }
    }

    /// Resolve the manifest path: an explicit one if given, otherwise search.
    pub fn manifest_path(&self, explicit: Option<&Path>) -> MatrixResult<PathBuf> {
        match explicit {
            Some(path) if path.is_absolute() => Ok(path.to_path_buf()),
            Some(path) => Ok(self.cwd.join(path)),
            None => self.find_manifest(),
        }
    }
}
