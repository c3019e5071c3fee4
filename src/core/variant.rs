//! Variant specifications and artifact naming.

use std::fmt;

/// One entry of the build matrix.
///
/// Flags are kept exactly as written: order matters for the artifact name,
/// and repeating an abbreviation is harmless when configuring.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    artifact_version: String,
    toolchain_version: String,
    enabled_flags: Vec<char>,
}

impl VariantSpec {
    pub fn new(
        artifact_version: impl Into<String>,
        toolchain_version: impl Into<String>,
        flags: &str,
    ) -> Self {
        VariantSpec {
            artifact_version: artifact_version.into(),
            toolchain_version: toolchain_version.into(),
            enabled_flags: flags.chars().collect(),
        }
    }

    pub fn artifact_version(&self) -> &str {
        &self.artifact_version
    }

    pub fn toolchain_version(&self) -> &str {
        &self.toolchain_version
    }

    pub fn enabled_flags(&self) -> &[char] {
        &self.enabled_flags
    }

    /// The flag abbreviations as one string, in input order.
    pub fn flag_string(&self) -> String {
        self.enabled_flags.iter().collect()
    }

    /// File name this variant is archived under.
    ///
    /// `<project>-<version>-<toolchain>-<flags>.<ext>`
    pub fn artifact_file_name(&self, project: &str, extension: &str) -> String {
        let mut name = format!(
            "{}-{}-{}-{}",
            project,
            self.artifact_version,
            self.toolchain_version,
            self.flag_string()
        );
        if !extension.is_empty() {
            name.push('.');
            name.push_str(extension);
        }
        name
    }
}

impl fmt::Display for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {})",
            self.artifact_version,
            self.toolchain_version,
            if self.enabled_flags.is_empty() {
                "no flags".to_string()
            } else {
                self.flag_string()
            }
        )
    }
}
