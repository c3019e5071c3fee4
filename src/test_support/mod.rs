//! Test utilities and mocks for capforge unit tests.
//!
//! Provides a scripted stand-in for the external toolchain plus fixtures
//! for registries and configuration documents.
//!
//! # Example
//!
//! ```rust,ignore
//! use capforge::test_support::{MockToolchain, sample_registry};
//!
//! #[test]
//! fn test_example() {
//!     let tool = MockToolchain::new(root.join("bin/App.cap"), root.join("build.xml"))
//!         .failing_build(2);
//!     // Hand `Box::new(tool.clone())` to a BuildInvoker, inspect `tool.calls()` afterwards.
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::builder::invoker::{BuildStep, BuildTool};
use crate::builder::toolchain::ToolchainEnv;
use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::flags::FlagRegistry;

/// Registry used throughout the tests: `R -> RSA`, `E -> EC`, `S -> STRICT`.
pub fn sample_registry() -> FlagRegistry {
    FlagRegistry::new([('R', "RSA"), ('E', "EC"), ('S', "STRICT")])
        .expect("sample registry is valid")
}

/// An Ant build file declaring the given boolean properties.
pub fn sample_build_xml(properties: &[(&str, bool)]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<project name=\"App\" default=\"dist\" basedir=\".\">\n",
    );
    for (name, value) in properties {
        xml.push_str(&format!(
            "  <property name=\"{}\" value=\"{}\"/>\n",
            name, value
        ));
    }
    xml.push_str("  <target name=\"dist\"/>\n</project>\n");
    xml
}

/// A single recorded toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub step: BuildStep,
    pub home: PathBuf,
}

/// Scripted toolchain.
///
/// A successful build step copies the current configuration document to
/// the artifact path, so every archived artifact records the configuration
/// it was built with. Clones share the call log.
#[derive(Debug, Clone)]
pub struct MockToolchain {
    calls: Arc<Mutex<Vec<ToolCall>>>,
    artifact: PathBuf,
    config: PathBuf,
    fail_build: Option<usize>,
    produce_artifact: bool,
}

impl MockToolchain {
    pub fn new(artifact: impl Into<PathBuf>, config: impl Into<PathBuf>) -> Self {
        MockToolchain {
            calls: Arc::new(Mutex::new(Vec::new())),
            artifact: artifact.into(),
            config: config.into(),
            fail_build: None,
            produce_artifact: true,
        }
    }

    /// Make the n-th build step (1-based) report failure.
    pub fn failing_build(mut self, n: usize) -> Self {
        self.fail_build = Some(n);
        self
    }

    /// Report success without leaving an artifact behind.
    pub fn without_artifact(mut self) -> Self {
        self.produce_artifact = false;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<ToolCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn build_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.step == BuildStep::Build)
            .count()
    }
}

impl BuildTool for MockToolchain {
    fn run(&self, step: BuildStep, env: &ToolchainEnv) -> MatrixResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ToolCall {
                step,
                home: env.home().to_path_buf(),
            });
        }

        match step {
            BuildStep::Clean => {
                let _ = std::fs::remove_file(&self.artifact);
                Ok(())
            }
            BuildStep::Build => {
                if self.fail_build == Some(self.build_count()) {
                    return Err(MatrixError::BuildTool {
                        command: "mock build".to_string(),
                        reason: "exit code 1".to_string(),
                    });
                }
                if self.produce_artifact {
                    copy_into(&self.config, &self.artifact)?;
                }
                Ok(())
            }
        }
    }
}

fn copy_into(from: &Path, to: &Path) -> MatrixResult<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| MatrixError::io("failed to create directory", parent, e))?;
    }
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|e| MatrixError::io("failed to copy", from, e))
}
