//! The shared configuration document.
//!
//! A configuration document is a tree of named boolean toggles read by the
//! external toolchain. The template is loaded once; every variant starts
//! from a reset copy with every registered symbol disabled, then enables
//! its own flags, and the result is written over the shared file.
//!
//! Two on-disk formats are supported, chosen by file extension:
//! - `.xml`: Ant build files with `<property name=".." value=".."/>` toggles
//! - `.toml`: TOML documents where symbols are (possibly dotted) keys
//!
//! Both are edited in place so bytes unrelated to the toggles survive.

mod ant;
mod toml_file;

use std::fmt;
use std::path::{Path, PathBuf};

pub use self::ant::AntDocument;
pub use self::toml_file::TomlDocument;

use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::flags::FlagRegistry;
use crate::util::fs;

/// On-disk format of a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Ant build file
    Ant,
    /// TOML document
    Toml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            ext if ext.eq_ignore_ascii_case("xml") => Some(DocumentFormat::Ant),
            ext if ext.eq_ignore_ascii_case("toml") => Some(DocumentFormat::Toml),
            _ => None,
        }
    }
}

/// Why a symbol could not be read or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// The document never declares the symbol.
    NotDeclared(String),
    /// The symbol exists but has no value slot to toggle.
    NoValue(String),
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolError::NotDeclared(s) => write!(f, "symbol `{}` is not declared", s),
            SymbolError::NoValue(s) => write!(f, "symbol `{}` has no value to toggle", s),
        }
    }
}

/// In-memory configuration document.
#[derive(Debug, Clone)]
pub enum ConfigDocument {
    Ant(AntDocument),
    Toml(TomlDocument),
}

impl ConfigDocument {
    /// Parse document text in the given format.
    pub fn parse(format: DocumentFormat, text: &str) -> Result<Self, String> {
        match format {
            DocumentFormat::Ant => AntDocument::parse(text).map(ConfigDocument::Ant),
            DocumentFormat::Toml => TomlDocument::parse(text).map(ConfigDocument::Toml),
        }
    }

    pub fn format(&self) -> DocumentFormat {
        match self {
            ConfigDocument::Ant(_) => DocumentFormat::Ant,
            ConfigDocument::Toml(_) => DocumentFormat::Toml,
        }
    }

    /// Current boolean value of a symbol, if it is declared and boolean.
    pub fn get(&self, symbol: &str) -> Option<bool> {
        match self {
            ConfigDocument::Ant(doc) => doc.get(symbol),
            ConfigDocument::Toml(doc) => doc.get(symbol),
        }
    }

    /// Set a symbol's value.
    pub fn set(&mut self, symbol: &str, enabled: bool) -> Result<(), SymbolError> {
        match self {
            ConfigDocument::Ant(doc) => doc.set(symbol, enabled),
            ConfigDocument::Toml(doc) => doc.set(symbol, enabled),
        }
    }

    /// Serialize to the on-disk representation.
    pub fn render(&self) -> String {
        match self {
            ConfigDocument::Ant(doc) => doc.render(),
            ConfigDocument::Toml(doc) => doc.render(),
        }
    }
}

impl PartialEq for ConfigDocument {
    fn eq(&self, other: &Self) -> bool {
        self.format() == other.format() && self.render() == other.render()
    }
}

impl Eq for ConfigDocument {}

/// Owner of the pristine template.
///
/// The template is read from disk exactly once. The file it came from is
/// the same file every variant overwrites, so the original text is kept for
/// an optional restore after the run.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    source: String,
    template: ConfigDocument,
}

impl ConfigStore {
    /// Load and parse the template.
    pub fn load_template(path: &Path) -> MatrixResult<Self> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            MatrixError::template(path, "unsupported format (expected a .xml or .toml file)")
        })?;

        let source = std::fs::read_to_string(path)
            .map_err(|e| MatrixError::template(path, e.to_string()))?;

        let template =
            ConfigDocument::parse(format, &source).map_err(|reason| MatrixError::template(path, reason))?;

        tracing::debug!("loaded {:?} configuration template from {}", format, path.display());

        Ok(ConfigStore {
            path: path.to_path_buf(),
            source,
            template,
        })
    }

    /// Path the template was loaded from (and that variants persist to).
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn template(&self) -> &ConfigDocument {
        &self.template
    }

    /// A working copy with every registered symbol disabled.
    ///
    /// Stale `true` values left in the template never leak into a variant.
    pub fn reset_all(&self, registry: &FlagRegistry) -> MatrixResult<ConfigDocument> {
        let mut doc = self.template.clone();
        for symbol in registry.all_symbols() {
            doc.set(symbol, false)
                .map_err(|e| MatrixError::template(&self.path, e.to_string()))?;
        }
        Ok(doc)
    }

    /// Write the original template text back to disk.
    pub fn restore(&self) -> MatrixResult<()> {
        fs::write_string(&self.path, &self.source)
    }
}
