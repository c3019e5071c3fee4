//! Core data structures for capforge.
//!
//! - Flag registry and variant specifications
//! - Configuration documents (Ant build files, TOML)
//! - The Matrix.toml manifest
//! - The error taxonomy

pub mod document;
pub mod errors;
pub mod flags;
pub mod manifest;
pub mod variant;

pub use document::{ConfigDocument, ConfigStore, DocumentFormat};
pub use errors::{MatrixError, MatrixResult};
pub use flags::{FlagDefinition, FlagRegistry};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use variant::VariantSpec;
