//! Matrix plan generation.
//!
//! A MatrixPlan describes what `capforge build` would do for each variant
//! without touching the configuration document or running the toolchain.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::builder::archive::ArtifactArchiver;
use crate::builder::toolchain::SdkLocator;
use crate::core::errors::MatrixResult;
use crate::core::manifest::Manifest;
use crate::ops::configure::VariantConfigurator;
use crate::util::fs::relative_path;

/// A complete matrix plan.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixPlan {
    pub project: String,

    /// Configuration document rewritten per variant
    pub config: PathBuf,

    /// Archive directory
    pub output_dir: PathBuf,

    /// Variants in build order
    pub variants: Vec<PlannedVariant>,
}

/// One planned variant.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedVariant {
    pub index: usize,
    pub version: String,
    pub toolchain: String,
    pub flags: String,

    /// Symbols set to true, everything else registered is false
    pub symbols: Vec<String>,

    /// SDK home exported to the toolchain, when the base is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain_home: Option<PathBuf>,

    /// Archive location, relative to the project root
    pub artifact: PathBuf,
}

impl MatrixPlan {
    /// Resolve every variant of `manifest`.
    ///
    /// Fails on the first variant naming an unknown flag.
    pub fn new(manifest: &Manifest, sdk: &SdkLocator) -> MatrixResult<Self> {
        let root = &manifest.manifest_dir;
        let configurator = VariantConfigurator::new(&manifest.registry, manifest.config_path());
        let archiver = ArtifactArchiver::from_manifest(manifest);

        let mut variants = Vec::with_capacity(manifest.variants.len());
        for (index, variant) in manifest.variants.iter().enumerate() {
            let symbols = configurator
                .resolve(variant)?
                .into_iter()
                .map(str::to_string)
                .collect();
            let toolchain_home = sdk.home_for(variant.toolchain_version()).ok();

            variants.push(PlannedVariant {
                index,
                version: variant.artifact_version().to_string(),
                toolchain: variant.toolchain_version().to_string(),
                flags: variant.flag_string(),
                symbols,
                toolchain_home,
                artifact: relative_path(root, &archiver.destination(variant)),
            });
        }

        Ok(MatrixPlan {
            project: manifest.project.name.clone(),
            config: manifest.config.path.clone(),
            output_dir: manifest.artifact.output_dir.clone(),
            variants,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
