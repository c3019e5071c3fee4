//! Filesystem utilities.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::core::errors::{MatrixError, MatrixResult};

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> MatrixResult<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .map_err(|e| MatrixError::io("failed to remove directory", path, e))?;
    }
    Ok(())
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> MatrixResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| MatrixError::io("failed to create directory", path, e))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> MatrixResult<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents).map_err(|e| MatrixError::io("failed to write file", path, e))
}

/// Move a file, replacing any existing file at `to`.
///
/// Falls back to copy + remove when a plain rename is not possible, e.g.
/// when the destination is on another filesystem.
pub fn move_file(from: &Path, to: &Path) -> MatrixResult<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) if rename_err.kind() != io::ErrorKind::NotFound => {
            tracing::debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                rename_err
            );
            fs::copy(from, to).map_err(|e| MatrixError::io("failed to copy artifact to", to, e))?;
            fs::remove_file(from)
                .map_err(|e| MatrixError::io("failed to remove moved artifact", from, e))
        }
        Err(e) => Err(MatrixError::io("failed to move artifact", from, e)),
    }
}

/// Get the relative path from `base` to `path`.
pub fn relative_path(base: &Path, path: &Path) -> PathBuf {
    pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_move_file_replaces_destination() {
        let tmp = TempDir::new().unwrap();
        let from = tmp.path().join("bin/app.cap");
        let to = tmp.path().join("dist/app-1.cap");
        write_string(&from, "new").unwrap();
        write_string(&to, "old").unwrap();

        move_file(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "new");
    }

    #[test]
    fn test_move_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = move_file(&tmp.path().join("nope"), &tmp.path().join("dst")).unwrap_err();
        assert!(matches!(err, MatrixError::Io { .. }));
    }

    #[test]
    fn test_remove_and_ensure_dir() {
        let tmp = TempDir::new().unwrap();
        let dist = tmp.path().join("dist");
        write_string(&dist.join("stale.cap"), "x").unwrap();

        remove_dir_all_if_exists(&dist).unwrap();
        assert!(!dist.exists());
        remove_dir_all_if_exists(&dist).unwrap();

        ensure_dir(&dist).unwrap();
        assert!(dist.is_dir());
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("/proj"), Path::new("/proj/dist/a.cap")),
            PathBuf::from("dist/a.cap")
        );
    }
}
