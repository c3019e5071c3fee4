//! Running the external toolchain.
//!
//! Each variant runs `clean` then `build`, synchronously, in the project
//! root. A failing exit status is always an error: it stops the matrix.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::builder::toolchain::{SdkLocator, ToolchainEnv};
use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::manifest::ToolchainSection;
use crate::util::process::{find_executable, Completion, ProcessBuilder};

/// Lines of toolchain output quoted in a failure message.
const OUTPUT_TAIL_LINES: usize = 20;

/// One of the two toolchain steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    Clean,
    Build,
}

impl fmt::Display for BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStep::Clean => write!(f, "clean"),
            BuildStep::Build => write!(f, "build"),
        }
    }
}

/// Something that can run a toolchain step.
pub trait BuildTool: fmt::Debug {
    /// Run `step` to completion; non-success must be an error.
    fn run(&self, step: BuildStep, env: &ToolchainEnv) -> MatrixResult<()>;
}

/// Toolchain driven by external commands.
#[derive(Debug, Clone)]
pub struct CommandTool {
    clean: Vec<String>,
    build: Vec<String>,
    cwd: PathBuf,
    timeout: Option<Duration>,
}

impl CommandTool {
    pub fn new(toolchain: &ToolchainSection, cwd: impl Into<PathBuf>) -> Self {
        CommandTool {
            clean: toolchain.clean.clone(),
            build: toolchain.build.clone(),
            cwd: cwd.into(),
            timeout: toolchain.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Kill a step that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn argv(&self, step: BuildStep) -> &[String] {
        match step {
            BuildStep::Clean => &self.clean,
            BuildStep::Build => &self.build,
        }
    }
}

impl BuildTool for CommandTool {
    fn run(&self, step: BuildStep, env: &ToolchainEnv) -> MatrixResult<()> {
        let argv = self.argv(step);
        let command = argv.join(" ");
        let (program, args) = argv.split_first().ok_or_else(|| MatrixError::BuildTool {
            command: step.to_string(),
            reason: "no command configured".to_string(),
        })?;

        // Bare names are looked up on PATH so a missing toolchain is reported
        // by name; anything with a separator is used as given.
        let program = if program.contains(['/', '\\']) {
            self.cwd.join(program)
        } else {
            find_executable(program).ok_or_else(|| MatrixError::BuildTool {
                command: command.clone(),
                reason: format!("`{}` was not found in PATH", program),
            })?
        };

        let pb = ProcessBuilder::new(&program)
            .args(args)
            .cwd(&self.cwd)
            .env(env.home_var(), env.home().to_string_lossy());

        tracing::debug!(
            "running `{}` with {}={}",
            pb.display_command(),
            env.home_var(),
            env.home().display()
        );

        let completion = pb
            .exec_with_timeout(self.timeout)
            .map_err(|e| MatrixError::BuildTool {
                command: command.clone(),
                reason: format!("{:#}", e),
            })?;

        let output = match completion {
            Completion::Finished(output) => output,
            Completion::TimedOut => {
                return Err(MatrixError::Timeout {
                    command,
                    secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            tracing::debug!("{}", line);
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| format!("exit code {}", c))
                .unwrap_or_else(|| "terminated by signal".to_string());
            let shown = if stderr.trim().is_empty() { &stdout } else { &stderr };
            let tail = tail_lines(shown, OUTPUT_TAIL_LINES);
            return Err(MatrixError::BuildTool {
                command,
                reason: if tail.is_empty() {
                    code
                } else {
                    format!("{}\n{}", code, tail)
                },
            });
        }

        Ok(())
    }
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

/// Prepares the SDK environment and runs the toolchain steps.
#[derive(Debug)]
pub struct BuildInvoker {
    sdk: SdkLocator,
    tool: Box<dyn BuildTool>,
}

impl BuildInvoker {
    pub fn new(sdk: SdkLocator, tool: Box<dyn BuildTool>) -> Self {
        BuildInvoker { sdk, tool }
    }

    /// Fail early when no SDK base directory is configured.
    pub fn check_environment(&self) -> MatrixResult<()> {
        self.sdk.require_base().map(|_| ())
    }

    pub fn prepare_environment(&self, toolchain_version: &str) -> MatrixResult<ToolchainEnv> {
        self.sdk.prepare_environment(toolchain_version)
    }

    pub fn invoke_clean(&self, env: &ToolchainEnv) -> MatrixResult<()> {
        self.tool.run(BuildStep::Clean, env)
    }

    pub fn invoke_build(&self, env: &ToolchainEnv) -> MatrixResult<()> {
        self.tool.run(BuildStep::Build, env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn section(clean: &[&str], build: &[&str]) -> ToolchainSection {
        ToolchainSection {
            clean: clean.iter().map(|s| s.to_string()).collect(),
            build: build.iter().map(|s| s.to_string()).collect(),
            ..ToolchainSection::default()
        }
    }

    fn env_for(tmp: &TempDir) -> ToolchainEnv {
        SdkLocator::new(Some(tmp.path().join("sdks")), &ToolchainSection::default())
            .prepare_environment("jc304")
            .unwrap()
    }

    #[test]
    fn test_tail_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("a\n", 5), "a");
        assert_eq!(tail_lines("", 5), "");
    }

    #[test]
    #[cfg(unix)]
    fn test_build_step_sees_sdk_home() {
        let tmp = TempDir::new().unwrap();
        let tool = CommandTool::new(
            &section(&["true"], &["sh", "-c", "printf %s \"$JC_HOME\" > home.txt"]),
            tmp.path(),
        );

        tool.run(BuildStep::Build, &env_for(&tmp)).unwrap();

        let home = std::fs::read_to_string(tmp.path().join("home.txt")).unwrap();
        assert_eq!(home, tmp.path().join("sdks/jc304_kit").to_string_lossy());
    }

    #[test]
    #[cfg(unix)]
    fn test_failing_step_is_build_tool_error() {
        let tmp = TempDir::new().unwrap();
        let tool = CommandTool::new(
            &section(&["true"], &["sh", "-c", "echo 'BUILD FAILED' >&2; exit 1"]),
            tmp.path(),
        );

        let err = tool.run(BuildStep::Build, &env_for(&tmp)).unwrap_err();
        match err {
            MatrixError::BuildTool { reason, .. } => {
                assert!(reason.contains("exit code 1"));
                assert!(reason.contains("BUILD FAILED"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_program_is_build_tool_error() {
        let tmp = TempDir::new().unwrap();
        let tool = CommandTool::new(
            &section(&["capforge-no-such-toolchain", "clean"], &["true"]),
            tmp.path(),
        );

        let err = tool.run(BuildStep::Clean, &env_for(&tmp)).unwrap_err();
        assert!(err.to_string().contains("not found in PATH"));
    }

    #[test]
    #[cfg(unix)]
    fn test_step_timeout() {
        let tmp = TempDir::new().unwrap();
        let tool = CommandTool::new(&section(&["true"], &["sleep", "5"]), tmp.path())
            .with_timeout(Some(Duration::from_millis(100)));

        let err = tool.run(BuildStep::Build, &env_for(&tmp)).unwrap_err();
        assert!(matches!(err, MatrixError::Timeout { .. }));
    }

    #[test]
    fn test_invoker_without_sdk_base() {
        let invoker = BuildInvoker::new(
            SdkLocator::new(None, &ToolchainSection::default()),
            Box::new(CommandTool::new(&ToolchainSection::default(), ".")),
        );
        assert!(matches!(
            invoker.check_environment(),
            Err(MatrixError::Environment { .. })
        ));
    }
}
