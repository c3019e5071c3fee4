//! Error taxonomy for matrix builds.
//!
//! Every error here is fatal to the whole matrix run: the configuration
//! document is shared and rewritten per variant, so there is no state a
//! later variant could safely continue from.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::util::diagnostic::{suggestions, Diagnostic};

/// Result alias for matrix operations.
pub type MatrixResult<T> = std::result::Result<T, MatrixError>;

/// Error raised by any stage of the matrix pipeline.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum MatrixError {
    /// Required external configuration (the SDK base directory) is missing.
    #[error("SDK base directory is not configured (set `{env_var}` or pass --sdk-dir)")]
    #[diagnostic(code(capforge::environment), help("set the SDK base directory via the environment, --sdk-dir, or [sdk] dir in config.toml"))]
    Environment { env_var: String },

    /// A variant names a flag abbreviation the registry does not know.
    #[error("unknown flag `{abbreviation}` in variant `{variant}`")]
    #[diagnostic(code(capforge::unknown_flag), help("run `capforge flags` to list registered abbreviations"))]
    UnknownFlag {
        abbreviation: char,
        variant: String,
        known: Vec<char>,
    },

    /// The configuration template is missing, unreadable, or malformed.
    #[error("failed to load configuration template `{}`: {reason}", .path.display())]
    #[diagnostic(code(capforge::template))]
    TemplateLoad { path: PathBuf, reason: String },

    /// `Matrix.toml` is missing or invalid.
    #[error("invalid manifest `{}`: {reason}", .path.display())]
    #[diagnostic(code(capforge::manifest))]
    Manifest { path: PathBuf, reason: String },

    /// The external toolchain could not be run or reported failure.
    #[error("`{command}` failed: {reason}")]
    #[diagnostic(code(capforge::build_tool), help("re-run with --verbose to see the toolchain output"))]
    BuildTool { command: String, reason: String },

    /// A toolchain step ran longer than the configured timeout and was killed.
    #[error("`{command}` timed out after {secs}s")]
    #[diagnostic(code(capforge::timeout))]
    Timeout { command: String, secs: u64 },

    /// The build reported success but left no artifact behind.
    #[error("expected artifact `{}` was not produced", .path.display())]
    #[diagnostic(code(capforge::artifact_not_found))]
    ArtifactNotFound { path: PathBuf },

    /// Filesystem failure while persisting or archiving.
    #[error("{action} `{}`", .path.display())]
    #[diagnostic(code(capforge::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MatrixError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MatrixError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn template(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MatrixError::TemplateLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        MatrixError::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.to_string());
        match self {
            MatrixError::Environment { env_var } => diag
                .with_context(format!("`{}` is unset and no [sdk] dir is configured", env_var))
                .with_suggestion(suggestions::SDK_MISSING),
            MatrixError::UnknownFlag { known, .. } => {
                let known: String = known.iter().collect();
                diag.with_context(format!("known flags: {}", known))
                    .with_suggestion(suggestions::UNKNOWN_FLAG)
            }
            MatrixError::TemplateLoad { path, .. } => diag.with_location(path),
            MatrixError::Manifest { path, .. } => diag
                .with_location(path)
                .with_suggestion(suggestions::NO_MANIFEST),
            MatrixError::BuildTool { .. } | MatrixError::Timeout { .. } => {
                diag.with_suggestion(suggestions::BUILD_FAILED)
            }
            MatrixError::ArtifactNotFound { path } => diag
                .with_location(path)
                .with_suggestion(suggestions::CHECK_ARTIFACT_PATH),
            MatrixError::Io { source, .. } => diag.with_context(source.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_flag_diagnostic_lists_known_flags() {
        let err = MatrixError::UnknownFlag {
            abbreviation: 'Z',
            variant: "1.0.0-jc304-RZ".to_string(),
            known: vec!['E', 'R'],
        };

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("unknown flag `Z`"));
        assert!(output.contains("known flags: ER"));
        assert!(output.contains("help: consider:"));
    }

    #[test]
    fn test_environment_error_names_variable() {
        let err = MatrixError::Environment {
            env_var: "JC_SDKS".to_string(),
        };
        assert!(err.to_string().contains("JC_SDKS"));
    }
}
