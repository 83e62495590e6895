//! File I/O utilities with atomic writes
//!
//! Files are written to a sibling temp file and renamed into place, so an
//! existing backup file is either fully replaced or left as it was.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::error::BackupError;

/// Read JSON from a file
pub fn read_json<T, P>(path: P) -> Result<T, BackupError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        BackupError::Filesystem(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .map_err(|e| BackupError::Json(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write pretty-printed JSON, replacing any existing file
///
/// The parent directory is created when missing.
pub fn write_json_pretty<T, P>(path: P, data: &T) -> Result<(), BackupError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    write_atomic(path.as_ref(), |writer| {
        serde_json::to_writer_pretty(&mut *writer, data)
            .map_err(|e| BackupError::Json(format!("Failed to serialize data: {}", e)))
    })
}

/// Write raw bytes, replacing any existing file
pub fn write_bytes<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<(), BackupError> {
    write_atomic(path.as_ref(), |writer| {
        writer
            .write_all(contents)
            .map_err(|e| BackupError::Filesystem(format!("Failed to write data: {}", e)))
    })
}

fn write_atomic<F>(path: &Path, fill: F) -> Result<(), BackupError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), BackupError>,
{
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BackupError::Filesystem(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Temp file in the same directory keeps the rename atomic
    let temp_path = temp_path_for(path);

    let file = File::create(&temp_path)
        .map_err(|e| BackupError::Filesystem(format!("Failed to create temp file: {}", e)))?;
    let mut writer = BufWriter::new(file);

    let written = fill(&mut writer).and_then(|_| {
        writer
            .flush()
            .map_err(|e| BackupError::Filesystem(format!("Failed to flush data: {}", e)))
    });
    if let Err(err) = written {
        drop(writer);
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    drop(writer);

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        BackupError::Filesystem(format!("Failed to move file into place at {}: {}", path.display(), e))
    })?;

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
