//! Moving toolchain output into the archive directory.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::manifest::Manifest;
use crate::core::variant::VariantSpec;
use crate::util::fs;

/// An archived artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildArtifact {
    /// Where the toolchain left it
    pub source_path: PathBuf,
    /// Where it was moved to
    pub destination_path: PathBuf,
}

/// Relocates the toolchain's fixed-path output to a per-variant name.
#[derive(Debug, Clone)]
pub struct ArtifactArchiver {
    source: PathBuf,
    output_dir: PathBuf,
    project: String,
    extension: String,
}

impl ArtifactArchiver {
    pub fn new(
        source: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        project: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        ArtifactArchiver {
            source: source.into(),
            output_dir: output_dir.into(),
            project: project.into(),
            extension: extension.into(),
        }
    }

    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self::new(
            manifest.artifact_path(),
            manifest.output_dir(),
            manifest.project.name.clone(),
            manifest.artifact.extension(),
        )
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Destination path for a variant. Pure function of the variant.
    pub fn destination(&self, variant: &VariantSpec) -> PathBuf {
        self.output_dir
            .join(variant.artifact_file_name(&self.project, &self.extension))
    }

    /// Remove everything from a previous run and recreate the directory.
    pub fn clear_output(&self) -> MatrixResult<()> {
        fs::remove_dir_all_if_exists(&self.output_dir)?;
        fs::ensure_dir(&self.output_dir)
    }

    /// Find the toolchain output.
    pub fn locate(&self) -> MatrixResult<PathBuf> {
        if self.source.is_file() {
            Ok(self.source.clone())
        } else {
            Err(MatrixError::ArtifactNotFound {
                path: self.source.clone(),
            })
        }
    }

    /// Move a located artifact to the variant's slot, replacing any
    /// artifact already archived under the same name.
    pub fn store(&self, located: PathBuf, variant: &VariantSpec) -> MatrixResult<BuildArtifact> {
        fs::ensure_dir(&self.output_dir)?;
        let destination = self.destination(variant);
        fs::move_file(&located, &destination)?;

        Ok(BuildArtifact {
            source_path: located,
            destination_path: destination,
        })
    }

    /// Locate and store in one step.
    pub fn archive(&self, variant: &VariantSpec) -> MatrixResult<BuildArtifact> {
        let located = self.locate()?;
        self.store(located, variant)
    }
}
