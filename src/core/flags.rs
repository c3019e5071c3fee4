//! Flag registry: single-character abbreviations to configuration symbols.
//!
//! The registry is built once from the `[flags]` table of `Matrix.toml` and
//! passed by reference to whatever needs to resolve abbreviations. It is
//! never mutated after construction.

use std::collections::BTreeMap;
use std::fmt;

/// A single registered flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagDefinition {
    /// Short user-facing code, e.g. `R`
    pub abbreviation: char,
    /// Configuration symbol it toggles, e.g. `PIV_SUPPORT_RSA`
    pub symbol: String,
}

/// Why a flag table was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagTableError {
    DuplicateAbbreviation(char),
    DuplicateSymbol(String),
    InvalidAbbreviation(String),
    EmptySymbol(char),
}

impl fmt::Display for FlagTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagTableError::DuplicateAbbreviation(c) => {
                write!(f, "flag abbreviation `{}` is registered twice", c)
            }
            FlagTableError::DuplicateSymbol(s) => {
                write!(f, "symbol `{}` is registered under more than one flag", s)
            }
            FlagTableError::InvalidAbbreviation(s) => write!(
                f,
                "flag abbreviation `{}` must be a single ASCII letter or digit",
                s
            ),
            FlagTableError::EmptySymbol(c) => write!(f, "flag `{}` maps to an empty symbol", c),
        }
    }
}

impl std::error::Error for FlagTableError {}

/// Lookup failure for an unregistered abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownFlag(pub char);

/// Immutable abbreviation -> symbol table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagRegistry {
    flags: BTreeMap<char, String>,
}

impl FlagRegistry {
    /// Build a registry, rejecting malformed abbreviations and any
    /// abbreviation or symbol registered twice.
    pub fn new<I, S>(entries: I) -> Result<Self, FlagTableError>
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        let mut flags: BTreeMap<char, String> = BTreeMap::new();
        for (abbreviation, symbol) in entries {
            if !abbreviation.is_ascii_alphanumeric() {
                return Err(FlagTableError::InvalidAbbreviation(abbreviation.to_string()));
            }
            let symbol: String = symbol.into();
            if symbol.trim().is_empty() {
                return Err(FlagTableError::EmptySymbol(abbreviation));
            }
            if flags.contains_key(&abbreviation) {
                return Err(FlagTableError::DuplicateAbbreviation(abbreviation));
            }
            if flags.values().any(|existing| *existing == symbol) {
                return Err(FlagTableError::DuplicateSymbol(symbol));
            }
            flags.insert(abbreviation, symbol);
        }
        Ok(FlagRegistry { flags })
    }

    /// Build a registry from string keys as they appear in a TOML table.
    pub fn from_table<'a, I>(entries: I) -> Result<Self, FlagTableError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut parsed = Vec::new();
        for (key, symbol) in entries {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => parsed.push((c, symbol)),
                _ => return Err(FlagTableError::InvalidAbbreviation(key.to_string())),
            }
        }
        Self::new(parsed)
    }

    /// Resolve an abbreviation to its symbol.
    pub fn lookup(&self, abbreviation: char) -> Result<&str, UnknownFlag> {
        self.flags
            .get(&abbreviation)
            .map(String::as_str)
            .ok_or(UnknownFlag(abbreviation))
    }

    /// Every registered symbol, in abbreviation order.
    pub fn all_symbols(&self) -> impl Iterator<Item = &str> {
        self.flags.values().map(String::as_str)
    }

    /// Every registered abbreviation, sorted.
    pub fn abbreviations(&self) -> Vec<char> {
        self.flags.keys().copied().collect()
    }

    /// Iterate over all definitions.
    pub fn iter(&self) -> impl Iterator<Item = FlagDefinition> + '_ {
        self.flags.iter().map(|(&abbreviation, symbol)| FlagDefinition {
            abbreviation,
            symbol: symbol.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }
}
