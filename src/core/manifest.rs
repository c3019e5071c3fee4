//! Matrix.toml manifest parsing and schema.
//!
//! The manifest is the only configuration surface of a matrix build: it
//! names the project, the shared configuration document, the external
//! toolchain commands, the flag registry, and the ordered variant list.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::core::errors::{MatrixError, MatrixResult};
use crate::core::flags::FlagRegistry;
use crate::core::variant::VariantSpec;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "Matrix.toml";

/// The parsed and validated manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Project metadata
    pub project: ProjectMetadata,

    /// Location of the shared configuration document
    pub config: ConfigSection,

    /// External toolchain description
    pub toolchain: ToolchainSection,

    /// Where the toolchain leaves its output and where it is archived
    pub artifact: ArtifactSection,

    /// Flag abbreviation table
    pub registry: FlagRegistry,

    /// Variants to build, in order
    pub variants: Vec<VariantSpec>,

    /// The directory containing this manifest
    pub manifest_dir: PathBuf,
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMetadata {
    /// Prefix of every archived artifact name
    pub name: String,

    /// Default artifact version for variants that don't override it
    pub version: String,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Configuration document read as the template and overwritten per variant
    #[serde(default = "default_config_path")]
    pub path: PathBuf,
}

impl Default for ConfigSection {
    fn default() -> Self {
        ConfigSection {
            path: default_config_path(),
        }
    }
}

/// `[toolchain]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ToolchainSection {
    /// Environment variable holding the base SDK directory
    #[serde(default = "default_sdk_env")]
    pub sdk_env: String,

    /// Environment variable exported to the toolchain with the selected SDK home
    #[serde(default = "default_home_env")]
    pub home_env: String,

    /// Appended to the toolchain version to form the SDK home directory name
    #[serde(default = "default_home_suffix")]
    pub home_suffix: String,

    /// argv of the clean step
    #[serde(default = "default_clean")]
    pub clean: Vec<String>,

    /// argv of the build step
    #[serde(default = "default_build")]
    pub build: Vec<String>,

    /// Per-step timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ToolchainSection {
    fn default() -> Self {
        ToolchainSection {
            sdk_env: default_sdk_env(),
            home_env: default_home_env(),
            home_suffix: default_home_suffix(),
            clean: default_clean(),
            build: default_build(),
            timeout_secs: None,
        }
    }
}

/// `[artifact]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArtifactSection {
    /// Fixed output path of the toolchain, relative to the project root
    pub path: PathBuf,

    /// Directory archived artifacts are moved into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Archived file extension; defaults to the extension of `path`
    #[serde(default)]
    pub extension: Option<String>,
}

impl ArtifactSection {
    /// Extension used for archived artifact names.
    pub fn extension(&self) -> String {
        self.extension.clone().unwrap_or_else(|| {
            self.path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
    }
}

fn default_config_path() -> PathBuf {
    PathBuf::from("build.xml")
}

fn default_sdk_env() -> String {
    "JC_SDKS".to_string()
}

fn default_home_env() -> String {
    "JC_HOME".to_string()
}

fn default_home_suffix() -> String {
    "_kit".to_string()
}

fn default_clean() -> Vec<String> {
    vec!["ant".to_string(), "clean".to_string()]
}

fn default_build() -> Vec<String> {
    vec!["ant".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

/// Raw manifest as deserialized from TOML.
#[derive(Debug, Deserialize)]
struct RawManifest {
    project: ProjectMetadata,

    #[serde(default)]
    config: ConfigSection,

    #[serde(default)]
    toolchain: ToolchainSection,

    artifact: ArtifactSection,

    #[serde(default)]
    flags: BTreeMap<String, String>,

    #[serde(default, rename = "variant")]
    variants: Vec<RawVariant>,
}

/// Raw `[[variant]]` entry.
#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(default)]
    version: Option<String>,

    toolchain: String,

    #[serde(default)]
    flags: String,
}

impl Manifest {
    /// Load a manifest from disk.
    pub fn load(path: &Path) -> MatrixResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MatrixError::manifest(path, format!("failed to read manifest: {}", e)))?;

        Self::parse(&content, path)
    }

    /// Parse manifest content.
    pub fn parse(content: &str, path: &Path) -> MatrixResult<Self> {
        let raw: RawManifest =
            toml::from_str(content).map_err(|e| MatrixError::manifest(path, e.to_string()))?;

        let manifest_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        if raw.project.name.trim().is_empty() {
            return Err(MatrixError::manifest(path, "[project] name must not be empty"));
        }
        if raw.project.version.trim().is_empty() {
            return Err(MatrixError::manifest(path, "[project] version must not be empty"));
        }
        if raw.toolchain.clean.is_empty() || raw.toolchain.build.is_empty() {
            return Err(MatrixError::manifest(
                path,
                "[toolchain] clean and build commands must not be empty",
            ));
        }
        if !is_name_component(&raw.project.name) {
            return Err(MatrixError::manifest(
                path,
                format!(
                    "[project] name `{}` must not contain path separators",
                    raw.project.name
                ),
            ));
        }
        for (field, rel) in [
            ("config.path", &raw.config.path),
            ("artifact.path", &raw.artifact.path),
            ("artifact.output-dir", &raw.artifact.output_dir),
        ] {
            if !is_project_relative(rel) {
                return Err(MatrixError::manifest(
                    path,
                    format!("`{}` must be a relative path inside the project", field),
                ));
            }
        }

        // The output directory is wiped before every run.
        let output_dir = normalized(&raw.artifact.output_dir);
        for (field, rel) in [
            ("config.path", raw.config.path.as_path()),
            ("artifact.path", raw.artifact.path.as_path()),
            ("the manifest", Path::new(MANIFEST_NAME)),
        ] {
            if normalized(rel).starts_with(&output_dir) {
                return Err(MatrixError::manifest(
                    path,
                    format!("`artifact.output-dir` must not contain {}", field),
                ));
            }
        }

        let registry = FlagRegistry::from_table(
            raw.flags.iter().map(|(k, v)| (k.as_str(), v.as_str())),
        )
        .map_err(|e| MatrixError::manifest(path, e.to_string()))?;

        let mut variants = Vec::with_capacity(raw.variants.len());
        for (index, variant) in raw.variants.into_iter().enumerate() {
            let toolchain = variant.toolchain.trim();
            if toolchain.is_empty()
                || toolchain.contains('-')
                || toolchain.contains(['/', '\\'])
            {
                return Err(MatrixError::manifest(
                    path,
                    format!(
                        "variant #{}: toolchain `{}` must be non-empty and contain no `-` or path separators",
                        index + 1,
                        variant.toolchain
                    ),
                ));
            }
            let version = variant
                .version
                .unwrap_or_else(|| raw.project.version.clone());
            if !is_name_component(&version) {
                return Err(MatrixError::manifest(
                    path,
                    format!(
                        "variant #{}: version `{}` must be non-empty and contain no path separators",
                        index + 1,
                        version
                    ),
                ));
            }
            variants.push(VariantSpec::new(version, toolchain, variant.flags.trim()));
        }

        Ok(Manifest {
            project: raw.project,
            config: raw.config,
            toolchain: raw.toolchain,
            artifact: raw.artifact,
            registry,
            variants,
            manifest_dir,
        })
    }

    /// Absolute path of the shared configuration document.
    pub fn config_path(&self) -> PathBuf {
        self.manifest_dir.join(&self.config.path)
    }

    /// Absolute path of the toolchain's fixed output artifact.
    pub fn artifact_path(&self) -> PathBuf {
        self.manifest_dir.join(&self.artifact.path)
    }

    /// Absolute path of the archive directory.
    pub fn output_dir(&self) -> PathBuf {
        self.manifest_dir.join(&self.artifact.output_dir)
    }

    /// Archived file names that more than one variant would write to.
    ///
    /// Later variants overwrite earlier ones at these names.
    pub fn colliding_artifacts(&self) -> Vec<String> {
        let ext = self.artifact.extension();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut collisions = Vec::new();
        for variant in &self.variants {
            let name = variant.artifact_file_name(&self.project.name, &ext);
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 2 {
                collisions.push(name);
            }
        }
        collisions
    }
}

/// Relative, free of `..`, and naming something below the project root.
fn is_project_relative(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && path.components().any(|c| matches!(c, Component::Normal(_)))
}

fn normalized(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// Usable as one segment of an archived file name.
fn is_name_component(s: &str) -> bool {
    !s.trim().is_empty() && !s.contains(['/', '\\'])
}

/// Generate a starter manifest for an applet project.
///
/// The flag table and matrix mirror the PIV applet's shipped variants.
pub fn generate_manifest(name: &str) -> String {
    format!(
        r#"[project]
name = "{name}"
version = "1.0.0"

[config]
path = "build.xml"

[toolchain]
sdk-env = "JC_SDKS"
home-env = "JC_HOME"
home-suffix = "_kit"
clean = ["ant", "clean"]
build = ["ant"]

[artifact]
path = "bin/{name}.cap"
output-dir = "dist"

[flags]
R = "PIV_SUPPORT_RSA"
E = "PIV_SUPPORT_EC"
e = "PIV_SUPPORT_ECCP384"
P = "PIV_USE_EC_PRECOMPHASH"
S = "PIV_STRICT_CONTACTLESS"
A = "YKPIV_ATTESTATION"
x = "APPLET_EXTLEN"
L = "APPLET_LOW_TRANSIENT"
a = "PIV_SUPPORT_AES"
D = "PIV_SUPPORT_3DES"

[[variant]]
toolchain = "jc222"
flags = "RESAxaD"

[[variant]]
toolchain = "jc304"
flags = "REePSAxa"

[[variant]]
toolchain = "jc304"
flags = "REePSAxaD"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> MatrixResult<Manifest> {
        Manifest::parse(content, Path::new("/proj/Matrix.toml"))
    }

    #[test]
    fn test_parse_generated_manifest() {
        let manifest = parse(&generate_manifest("PivApplet")).unwrap();

        assert_eq!(manifest.project.name, "PivApplet");
        assert_eq!(manifest.registry.len(), 10);
        assert_eq!(manifest.registry.lookup('e'), Ok("PIV_SUPPORT_ECCP384"));
        assert_eq!(manifest.variants.len(), 3);
        assert_eq!(manifest.variants[0].toolchain_version(), "jc222");
        assert_eq!(manifest.variants[0].artifact_version(), "1.0.0");
        assert_eq!(manifest.variants[2].flag_string(), "REePSAxaD");
        assert_eq!(manifest.artifact.extension(), "cap");
        assert_eq!(manifest.config_path(), PathBuf::from("/proj/build.xml"));
        assert_eq!(manifest.output_dir(), PathBuf::from("/proj/dist"));
        assert!(manifest.colliding_artifacts().is_empty());
    }

    #[test]
    fn test_defaults_and_version_override() {
        let manifest = parse(
            r#"
[project]
name = "App"
version = "2.0"

[artifact]
path = "out/app.bin"

[flags]
R = "RSA"

[[variant]]
toolchain = "v1"
flags = "R"

[[variant]]
version = "2.1-rc1"
toolchain = "v2"
"#,
        )
        .unwrap();

        assert_eq!(manifest.toolchain.sdk_env, "JC_SDKS");
        assert_eq!(manifest.toolchain.build, vec!["ant".to_string()]);
        assert_eq!(manifest.config.path, PathBuf::from("build.xml"));
        assert_eq!(manifest.variants[0].artifact_version(), "2.0");
        assert_eq!(manifest.variants[1].artifact_version(), "2.1-rc1");
        assert!(manifest.variants[1].enabled_flags().is_empty());
    }

    #[test]
    fn test_colliding_artifacts_reported() {
        let manifest = parse(
            r#"
[project]
name = "App"
version = "1.0"

[artifact]
path = "bin/app.cap"

[flags]
R = "RSA"
E = "EC"

[[variant]]
toolchain = "v1"
flags = "RE"

[[variant]]
toolchain = "v1"
flags = "RE"
"#,
        )
        .unwrap();

        assert_eq!(manifest.colliding_artifacts(), vec!["App-1.0-v1-RE.cap"]);
    }

    #[test]
    fn test_rejects_dash_in_toolchain() {
        let err = parse(
            r#"
[project]
name = "App"
version = "1.0"

[artifact]
path = "bin/app.cap"

[[variant]]
toolchain = "jc-304"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, MatrixError::Manifest { .. }));
        assert!(err.to_string().contains("jc-304"));
    }

    #[test]
    fn test_rejects_multi_char_flag_key() {
        let err = parse(
            r#"
[project]
name = "App"
version = "1.0"

[artifact]
path = "bin/app.cap"

[flags]
RS = "RSA"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("single ASCII letter or digit"));
    }

    #[test]
    fn test_rejects_escaping_paths() {
        let err = parse(
            r#"
[project]
name = "App"
version = "1.0"

[artifact]
path = "bin/app.cap"
output-dir = "../dist"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("artifact.output-dir"));
    }

    fn with_artifact(artifact: &str) -> String {
        format!(
            "[project]\nname = \"App\"\nversion = \"1.0\"\n\n[artifact]\n{}\n",
            artifact
        )
    }

    #[test]
    fn test_rejects_project_root_as_output_dir() {
        for dir in [".", "./", "./."] {
            let content = with_artifact(&format!(
                "path = \"bin/app.cap\"\noutput-dir = \"{}\"",
                dir
            ));
            let err = parse(&content).unwrap_err();
            assert!(
                err.to_string().contains("artifact.output-dir"),
                "`{}` accepted: {}",
                dir,
                err
            );
        }
    }

    #[test]
    fn test_rejects_output_dir_holding_project_files() {
        let err = parse(&with_artifact("path = \"dist/app.cap\"")).unwrap_err();
        assert!(err.to_string().contains("must not contain artifact.path"));

        let content = format!(
            "{}\n[config]\npath = \"out/build.xml\"\n",
            with_artifact("path = \"bin/app.cap\"\noutput-dir = \"./out\"")
        );
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("must not contain config.path"));

        let manifest = parse(&with_artifact(
            "path = \"bin/app.cap\"\noutput-dir = \"dist/caps\"",
        ))
        .unwrap();
        assert_eq!(manifest.output_dir(), PathBuf::from("/proj/dist/caps"));
    }

    #[test]
    fn test_rejects_path_separators_in_names() {
        for version in ["1.0/x", "../../../tmp/x", "1.0\\x", " "] {
            let content = format!(
                "{}\n[[variant]]\nversion = '{}'\ntoolchain = \"v1\"\n",
                with_artifact("path = \"bin/app.cap\""),
                version
            );
            let err = parse(&content).unwrap_err();
            assert!(err.to_string().contains("variant #1: version"), "{}", err);
        }

        let content = with_artifact("path = \"bin/app.cap\"").replace("\"App\"", "\"../App\"");
        let err = parse(&content).unwrap_err();
        assert!(err.to_string().contains("[project] name"));
    }

    #[test]
    fn test_missing_project_section() {
        let err = parse("[artifact]\npath = \"a.cap\"\n").unwrap_err();
        assert!(matches!(err, MatrixError::Manifest { .. }));
    }
}
