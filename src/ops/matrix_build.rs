//! Implementation of `capforge build`.
//!
//! Variants run strictly one after another: they share one configuration
//! file and one toolchain output path, so the first failure ends the run.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;

use crate::builder::archive::{ArtifactArchiver, BuildArtifact};
use crate::builder::events::MatrixEvent;
use crate::builder::invoker::{BuildInvoker, CommandTool};
use crate::builder::plan::MatrixPlan;
use crate::builder::toolchain::SdkLocator;
use crate::core::document::ConfigStore;
use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::flags::FlagRegistry;
use crate::core::manifest::Manifest;
use crate::core::variant::VariantSpec;
use crate::ops::configure::VariantConfigurator;
use crate::util::config::Config;
use crate::util::diagnostic::Diagnostic;
use crate::util::shell::{format_duration, Shell, Status};

/// Step of the per-variant pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Reset,
    Configure,
    Persist,
    PrepareEnv,
    Clean,
    Build,
    Locate,
    Archive,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Reset => "reset",
            Stage::Configure => "configure",
            Stage::Persist => "persist",
            Stage::PrepareEnv => "prepare-env",
            Stage::Clean => "clean",
            Stage::Build => "build",
            Stage::Locate => "locate",
            Stage::Archive => "archive",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Where a driver is. `variant` is the zero-based matrix index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixState {
    Idle,
    Running { variant: usize, stage: Stage },
    Done,
    Failed { variant: usize, stage: Stage },
}

/// A matrix run that stopped early.
#[derive(Debug, Error)]
#[error("variant #{} {} failed during {}", .index + 1, .variant, .stage)]
pub struct MatrixRunError {
    /// Zero-based position of the failing variant
    pub index: usize,
    pub variant: VariantSpec,
    pub stage: Stage,
    /// Artifacts completed before the failure
    pub archived: Vec<BuildArtifact>,
    pub source: MatrixError,
}

impl MatrixRunError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let mut diag = self.source.to_diagnostic().with_context(self.to_string());
        if !self.archived.is_empty() {
            diag = diag.with_context(format!(
                "{} variant(s) were archived before the failure",
                self.archived.len()
            ));
        }
        diag
    }
}

/// Runs a list of variants through reset, configure, persist, build and
/// archive.
#[derive(Debug)]
pub struct MatrixDriver<'a> {
    registry: &'a FlagRegistry,
    store: ConfigStore,
    invoker: BuildInvoker,
    archiver: ArtifactArchiver,
    shell: &'a Shell,
    restore_config: bool,
    state: MatrixState,
}

impl<'a> MatrixDriver<'a> {
    /// Validate the environment and clear the output directory.
    ///
    /// A missing SDK base directory fails here, before anything is written.
    pub fn new(
        registry: &'a FlagRegistry,
        store: ConfigStore,
        invoker: BuildInvoker,
        archiver: ArtifactArchiver,
        shell: &'a Shell,
    ) -> MatrixResult<Self> {
        invoker.check_environment()?;
        archiver.clear_output()?;
        tracing::debug!("cleared {}", archiver.output_dir().display());

        Ok(MatrixDriver {
            registry,
            store,
            invoker,
            archiver,
            shell,
            restore_config: false,
            state: MatrixState::Idle,
        })
    }

    /// Write the pristine template back once the run ends.
    pub fn with_restore(mut self, restore: bool) -> Self {
        self.restore_config = restore;
        self
    }

    pub fn state(&self) -> MatrixState {
        self.state
    }

    /// Build every variant in order.
    pub fn run(&mut self, variants: &[VariantSpec]) -> Result<Vec<BuildArtifact>, MatrixRunError> {
        let start = Instant::now();
        let configurator = VariantConfigurator::new(self.registry, self.store.path().to_path_buf());
        let progress = self.shell.progress(variants.len() as u64, "variants");
        let mut archived: Vec<BuildArtifact> = Vec::with_capacity(variants.len());

        for (index, variant) in variants.iter().enumerate() {
            self.shell.json_event(&MatrixEvent::started(index, variant));
            progress.suspend(|| {
                self.shell.status(
                    Status::Building,
                    format!("{} [{}/{}]", variant, index + 1, variants.len()),
                )
            });

            match self.run_variant(index, variant, &configurator) {
                Ok(artifact) => {
                    tracing::info!(
                        "archived {} as {}",
                        variant,
                        artifact.destination_path.display()
                    );
                    self.shell
                        .json_event(&MatrixEvent::archived(index, &artifact.destination_path));
                    progress.suspend(|| {
                        self.shell
                            .status(Status::Archived, display_name(&artifact.destination_path))
                    });
                    progress.inc(1);
                    archived.push(artifact);
                }
                Err(source) => {
                    let stage = match self.state {
                        MatrixState::Running { stage, .. } => stage,
                        _ => Stage::Reset,
                    };
                    self.transition(MatrixState::Failed {
                        variant: index,
                        stage,
                    });
                    progress.finish();

                    let error = MatrixRunError {
                        index,
                        variant: variant.clone(),
                        stage,
                        archived,
                        source,
                    };
                    self.shell.json_event(&MatrixEvent::finished(
                        error.archived.len(),
                        millis(start.elapsed()),
                        Some(format!("{}: {}", error, error.source)),
                    ));
                    self.restore();
                    return Err(error);
                }
            }
        }

        progress.finish();
        self.transition(MatrixState::Done);
        self.shell.json_event(&MatrixEvent::finished(
            archived.len(),
            millis(start.elapsed()),
            None,
        ));
        self.shell.status(
            Status::Finished,
            format!(
                "{} variant(s) in {} into {}",
                archived.len(),
                format_duration(start.elapsed()),
                self.archiver.output_dir().display()
            ),
        );
        self.restore();

        Ok(archived)
    }

    fn run_variant(
        &mut self,
        index: usize,
        variant: &VariantSpec,
        configurator: &VariantConfigurator<'_>,
    ) -> MatrixResult<BuildArtifact> {
        self.enter(index, Stage::Reset);
        let doc = self.store.reset_all(self.registry)?;

        self.enter(index, Stage::Configure);
        let doc = configurator.apply(doc, variant)?;

        self.enter(index, Stage::Persist);
        configurator.persist(&doc)?;

        self.enter(index, Stage::PrepareEnv);
        let env = self
            .invoker
            .prepare_environment(variant.toolchain_version())?;

        self.enter(index, Stage::Clean);
        self.invoker.invoke_clean(&env)?;

        self.enter(index, Stage::Build);
        self.invoker.invoke_build(&env)?;

        self.enter(index, Stage::Locate);
        let located = self.archiver.locate()?;

        self.enter(index, Stage::Archive);
        let artifact = self.archiver.store(located, variant)?;

        self.enter(index, Stage::Done);
        Ok(artifact)
    }

    fn enter(&mut self, variant: usize, stage: Stage) {
        self.transition(MatrixState::Running { variant, stage });
    }

    fn transition(&mut self, next: MatrixState) {
        tracing::debug!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn restore(&self) {
        if !self.restore_config {
            return;
        }
        match self.store.restore() {
            Ok(()) => self.shell.status(
                Status::Restored,
                self.store.path().display(),
            ),
            Err(e) => {
                tracing::warn!("failed to restore configuration template: {}", e);
                self.shell
                    .warn(format!("could not restore {}: {}", self.store.path().display(), e));
            }
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Options for the build command.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// SDK base directory given on the command line
    pub sdk_dir: Option<PathBuf>,

    /// Print the resolved plan instead of building
    pub emit_plan: bool,

    /// Put the pristine configuration back after the run
    pub restore_config: bool,
}

/// Build the whole matrix described by `manifest`.
///
/// Returns the archived artifacts in matrix order. With `emit_plan` set,
/// prints the plan as JSON and builds nothing.
pub fn build(
    manifest: &Manifest,
    config: &Config,
    opts: &BuildOptions,
    shell: &Shell,
) -> Result<Vec<BuildArtifact>> {
    let sdk = SdkLocator::resolve(opts.sdk_dir.clone(), &manifest.toolchain, config);

    if opts.emit_plan {
        let plan = MatrixPlan::new(manifest, &sdk)?;
        println!("{}", plan.to_json()?);
        return Ok(Vec::new());
    }

    for name in manifest.colliding_artifacts() {
        tracing::warn!("several variants archive to `{}`; the last one wins", name);
    }

    let store = ConfigStore::load_template(&manifest.config_path())?;

    let timeout = manifest
        .toolchain
        .timeout_secs
        .or(config.build.timeout_secs)
        .map(Duration::from_secs);
    let tool = CommandTool::new(&manifest.toolchain, &manifest.manifest_dir).with_timeout(timeout);
    let invoker = BuildInvoker::new(sdk, Box::new(tool));
    let archiver = ArtifactArchiver::from_manifest(manifest);

    let mut driver = MatrixDriver::new(&manifest.registry, store, invoker, archiver, shell)?
        .with_restore(opts.restore_config || config.build.restore_config);

    Ok(driver.run(&manifest.variants)?)
}
