//! Implementation of `capforge init` and `capforge clean`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::errors::MatrixResult;
use crate::core::manifest::{generate_manifest, Manifest, MANIFEST_NAME};
use crate::util::fs::remove_dir_all_if_exists;

/// Options for `capforge init`.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    /// Project name; defaults to the directory name
    pub name: Option<String>,
}

/// Write a starter Matrix.toml into `path`.
pub fn init_project(path: &Path, opts: &InitOptions) -> Result<PathBuf> {
    let manifest_path = path.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("`{}` already exists in `{}`", MANIFEST_NAME, path.display());
    }

    let name = match &opts.name {
        Some(name) => name.clone(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot infer a project name; pass --name")?,
    };
    if name.trim().is_empty() || name.contains(['"', '\\', '\n']) {
        bail!("invalid project name `{}`", name);
    }

    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))?;
    fs::write(&manifest_path, generate_manifest(&name))
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(manifest_path)
}

/// Remove the archive directory. Returns whether anything was there.
pub fn clean(manifest: &Manifest) -> MatrixResult<bool> {
    let output_dir = manifest.output_dir();
    let existed = output_dir.exists();
    remove_dir_all_if_exists(&output_dir)?;
    Ok(existed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_manifest() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("PivApplet");

        let path = init_project(&dir, &InitOptions::default()).unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.project.name, "PivApplet");
        assert_eq!(manifest.variants.len(), 3);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(MANIFEST_NAME), "keep me").unwrap();

        let err = init_project(
            tmp.path(),
            &InitOptions {
                name: Some("App".to_string()),
            },
        )
        .unwrap_err();

        assert!(err.to_string().contains("already exists"));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(MANIFEST_NAME)).unwrap(),
            "keep me"
        );
    }

    #[test]
    fn test_clean_removes_output_dir() {
        let tmp = TempDir::new().unwrap();
        let path = init_project(
            tmp.path(),
            &InitOptions {
                name: Some("App".to_string()),
            },
        )
        .unwrap();
        let manifest = Manifest::load(&path).unwrap();
        std::fs::create_dir_all(tmp.path().join("dist")).unwrap();
        std::fs::write(tmp.path().join("dist/App-1.0.0-jc222-R.cap"), "x").unwrap();

        assert!(clean(&manifest).unwrap());
        assert!(!tmp.path().join("dist").exists());
        assert!(!clean(&manifest).unwrap());
    }
}
