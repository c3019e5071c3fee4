//! Matrix event types for JSON output.
//!
//! These events are emitted, one JSON object per line, when using
//! `--message-format=json`.
//!
//! # Event Types
//!
//! - `variant-started`: A variant entered the pipeline
//! - `variant-archived`: A variant's artifact was moved into the output directory
//! - `matrix-finished`: The run completed (success or failure)
//!
//! # Stability
//!
//! New fields may be added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

use crate::core::variant::VariantSpec;

/// An event emitted while running a matrix.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "reason")]
pub enum MatrixEvent {
    /// A variant entered the pipeline.
    #[serde(rename = "variant-started")]
    VariantStarted {
        /// Zero-based position in the matrix
        index: usize,
        version: String,
        toolchain: String,
        flags: String,
    },

    /// A variant's artifact was archived.
    #[serde(rename = "variant-archived")]
    VariantArchived {
        index: usize,
        /// Final location of the artifact
        artifact: PathBuf,
    },

    /// The run completed.
    #[serde(rename = "matrix-finished")]
    MatrixFinished {
        success: bool,
        /// Number of artifacts archived
        archived: usize,
        /// Total wall-clock time in milliseconds
        duration_ms: u64,
        /// Failure description
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl MatrixEvent {
    pub fn started(index: usize, variant: &VariantSpec) -> Self {
        MatrixEvent::VariantStarted {
            index,
            version: variant.artifact_version().to_string(),
            toolchain: variant.toolchain_version().to_string(),
            flags: variant.flag_string(),
        }
    }

    pub fn archived(index: usize, artifact: impl Into<PathBuf>) -> Self {
        MatrixEvent::VariantArchived {
            index,
            artifact: artifact.into(),
        }
    }

    pub fn finished(archived: usize, duration_ms: u64, error: Option<String>) -> Self {
        MatrixEvent::MatrixFinished {
            success: error.is_none(),
            archived,
            duration_ms,
            error,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
