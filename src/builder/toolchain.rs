//! SDK location and per-variant toolchain environment.
//!
//! Installed SDKs live side by side under one base directory; a variant's
//! toolchain version selects `<base>/<version><suffix>` as the SDK home,
//! which is exported to the build through an environment variable.

use std::path::{Path, PathBuf};

use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::manifest::ToolchainSection;
use crate::util::config::Config;

/// Environment handed to a toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainEnv {
    toolchain_version: String,
    home_var: String,
    home: PathBuf,
}

impl ToolchainEnv {
    pub fn toolchain_version(&self) -> &str {
        &self.toolchain_version
    }

    /// Name of the variable the SDK home is exported as.
    pub fn home_var(&self) -> &str {
        &self.home_var
    }

    pub fn home(&self) -> &Path {
        &self.home
    }
}

/// Resolves toolchain versions to SDK homes.
#[derive(Debug, Clone)]
pub struct SdkLocator {
    base: Option<PathBuf>,
    sdk_env: String,
    home_env: String,
    home_suffix: String,
}

impl SdkLocator {
    pub fn new(base: Option<PathBuf>, toolchain: &ToolchainSection) -> Self {
        SdkLocator {
            base,
            sdk_env: toolchain.sdk_env.clone(),
            home_env: toolchain.home_env.clone(),
            home_suffix: toolchain.home_suffix.clone(),
        }
    }

    /// Locate the SDK base directory.
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Explicit directory (`--sdk-dir`)
    /// 2. The environment variable named by `sdk-env`
    /// 3. `[sdk] dir` from the merged user configuration
    pub fn resolve(
        explicit: Option<PathBuf>,
        toolchain: &ToolchainSection,
        config: &Config,
    ) -> Self {
        let from_env = std::env::var_os(&toolchain.sdk_env)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let base = explicit.or(from_env).or_else(|| config.sdk.dir.clone());
        Self::new(base, toolchain)
    }

    pub fn base(&self) -> Option<&Path> {
        self.base.as_deref()
    }

    /// The base directory, or an environment error naming where to set it.
    pub fn require_base(&self) -> MatrixResult<&Path> {
        self.base().ok_or_else(|| MatrixError::Environment {
            env_var: self.sdk_env.clone(),
        })
    }

    /// SDK home for a toolchain version.
    pub fn home_for(&self, toolchain_version: &str) -> MatrixResult<PathBuf> {
        let base = self.require_base()?;
        Ok(base.join(format!("{}{}", toolchain_version, self.home_suffix)))
    }

    /// Compute the environment for one variant's toolchain.
    pub fn prepare_environment(&self, toolchain_version: &str) -> MatrixResult<ToolchainEnv> {
        let home = self.home_for(toolchain_version)?;
        if !home.is_dir() {
            tracing::warn!(
                "SDK home {} for toolchain `{}` does not exist",
                home.display(),
                toolchain_version
            );
        }
        tracing::debug!("{}={}", self.home_env, home.display());

        Ok(ToolchainEnv {
            toolchain_version: toolchain_version.to_string(),
            home_var: self.home_env.clone(),
            home,
        })
    }
}
