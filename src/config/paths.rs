//! Path management for the backup output tree
//!
//! Every file the tool writes lives under a single root:
//!
//! ```text
//! <root>/
//!   IntuneBackupDeviceConfiguration-warnings.txt
//!   <Category>/<name>.json
//!   <Category>/Assignments/<name>.json
//! ```

use std::path::{Path, PathBuf};

use crate::error::BackupError;

/// Name of the append-only secret-resolution warnings log
pub const WARNINGS_FILE_NAME: &str = "IntuneBackupDeviceConfiguration-warnings.txt";

/// Manages all paths used by a backup run
#[derive(Debug, Clone)]
pub struct BackupPaths {
    /// Root of the output tree
    root: PathBuf,
}

impl BackupPaths {
    /// Create a BackupPaths rooted at the given output directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the folder for a category (`<root>/<folder>`)
    ///
    /// Nested folders such as `Device Configurations/Assignments` are given
    /// with `/` separators and joined component by component.
    pub fn category_dir(&self, folder: &str) -> PathBuf {
        folder
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Get the JSON file for an already-sanitized object name
    pub fn object_file(&self, folder: &str, file_stem: &str) -> PathBuf {
        self.category_dir(folder).join(format!("{}.json", file_stem))
    }

    /// Get the path to the secret-resolution warnings log
    pub fn warnings_file(&self) -> PathBuf {
        self.root.join(WARNINGS_FILE_NAME)
    }

    /// Path relative to the root, used in backup records
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    /// Ensure the root directory exists
    pub fn ensure_root(&self) -> Result<(), BackupError> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            BackupError::Filesystem(format!(
                "Failed to create output directory {}: {}",
                self.root.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_category_dir() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::new(temp_dir.path());

        assert_eq!(
            paths.category_dir("Device Configurations"),
            temp_dir.path().join("Device Configurations")
        );
        assert_eq!(
            paths.category_dir("Client Apps/Assignments"),
            temp_dir.path().join("Client Apps").join("Assignments")
        );
    }

    #[test]
    fn test_file_paths() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::new(temp_dir.path());

        assert_eq!(
            paths.object_file("Device Compliance Policies", "Baseline"),
            temp_dir
                .path()
                .join("Device Compliance Policies")
                .join("Baseline.json")
        );
        assert_eq!(
            paths.warnings_file(),
            temp_dir.path().join(WARNINGS_FILE_NAME)
        );
    }

    #[test]
    fn test_relative() {
        let paths = BackupPaths::new("/backups/tenant");
        let file = paths.object_file("Client Apps", "Edge");
        assert_eq!(
            paths.relative(&file),
            Path::new("Client Apps").join("Edge.json")
        );
    }

    #[test]
    fn test_ensure_root() {
        let temp_dir = TempDir::new().unwrap();
        let paths = BackupPaths::new(temp_dir.path().join("nested").join("out"));

        paths.ensure_root().unwrap();
        assert!(paths.root().exists());
    }
}
