//! Append-only warnings log
//!
//! One human-readable line per warning. The file is opened in append mode for
//! every write and flushed immediately, so a crash never loses earlier lines.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{BackupError, BackupResult};

/// Writes warning lines to a text file
pub struct WarningLog {
    /// Path to the log file
    log_path: PathBuf,
}

impl WarningLog {
    /// Create a WarningLog that appends to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one warning line, prefixed with a UTC timestamp
    pub fn append(&self, message: &str) -> BackupResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                BackupError::Filesystem(format!(
                    "Failed to open warnings log {}: {}",
                    self.log_path.display(),
                    e
                ))
            })?;

        // Keep one warning per line even if the message carries newlines
        let message = message.replace(['\r', '\n'], " ");

        writeln!(
            file,
            "[{}] WARNING: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            message
        )
        .map_err(|e| BackupError::Filesystem(format!("Failed to write warnings log: {}", e)))?;

        file.flush()
            .map_err(|e| BackupError::Filesystem(format!("Failed to flush warnings log: {}", e)))?;

        Ok(())
    }

    /// Read every line of the log
    pub fn read_lines(&self) -> BackupResult<Vec<String>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path).map_err(|e| {
            BackupError::Filesystem(format!("Failed to open warnings log: {}", e))
        })?;

        BufReader::new(file)
            .lines()
            .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
            .map(|line| {
                line.map_err(|e| BackupError::Filesystem(format!("Failed to read warnings log: {}", e)))
            })
            .collect()
    }

    /// Check if the log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    /// Get the path to the log file
    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
