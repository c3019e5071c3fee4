//! Turning a variant into a concrete configuration document.

use std::path::{Path, PathBuf};

use crate::core::document::ConfigDocument;
use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::flags::FlagRegistry;
use crate::core::variant::VariantSpec;
use crate::util::fs;

/// Enables a variant's flags on a reset document and writes it out.
#[derive(Debug, Clone)]
pub struct VariantConfigurator<'a> {
    registry: &'a FlagRegistry,
    path: PathBuf,
}

impl<'a> VariantConfigurator<'a> {
    /// `path` is where [`persist`](Self::persist) writes: the location the
    /// toolchain reads its configuration from.
    pub fn new(registry: &'a FlagRegistry, path: impl Into<PathBuf>) -> Self {
        VariantConfigurator {
            registry,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a variant's abbreviations to symbols, in input order with
    /// repeats removed.
    ///
    /// The first unknown abbreviation fails the whole variant.
    pub fn resolve(&self, variant: &VariantSpec) -> MatrixResult<Vec<&'a str>> {
        let mut symbols: Vec<&'a str> = Vec::with_capacity(variant.enabled_flags().len());
        for &abbreviation in variant.enabled_flags() {
            let symbol = self
                .registry
                .lookup(abbreviation)
                .map_err(|e| MatrixError::UnknownFlag {
                    abbreviation: e.0,
                    variant: variant.to_string(),
                    known: self.registry.abbreviations(),
                })?;
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    /// Enable every flag of `variant` on `doc`.
    ///
    /// All abbreviations are resolved before anything is set, so a failing
    /// variant never yields a half-configured document.
    pub fn apply(&self, mut doc: ConfigDocument, variant: &VariantSpec) -> MatrixResult<ConfigDocument> {
        for symbol in self.resolve(variant)? {
            doc.set(symbol, true)
                .map_err(|e| MatrixError::template(&self.path, e.to_string()))?;
        }
        Ok(doc)
    }

    /// Replace the on-disk configuration with `doc`.
    pub fn persist(&self, doc: &ConfigDocument) -> MatrixResult<()> {
        tracing::debug!("writing configuration to {}", self.path.display());
        fs::write_string(&self.path, &doc.render())
    }
}
