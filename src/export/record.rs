//! Backup records
//!
//! One record is emitted per file written. Records are progress output only
//! and are never persisted by the tool itself.

use serde::{Deserialize, Serialize};
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Action recorded for every written file
pub const BACKUP_ACTION: &str = "Backup";

/// A single written file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Tabled)]
#[serde(rename_all = "PascalCase")]
pub struct BackupRecord {
    /// Always `"Backup"`
    pub action: String,

    /// Category the file belongs to, e.g. `"Device Configuration"`
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub kind: String,

    /// Display name of the exported object
    pub name: String,

    /// Path of the file relative to the backup root
    pub path: String,
}

impl BackupRecord {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            action: BACKUP_ACTION.to_string(),
            kind: kind.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// Emit the record to the log
    pub fn emit(&self) {
        tracing::info!(
            action = %self.action,
            kind = %self.kind,
            name = %self.name,
            path = %self.path,
            "Backup"
        );
    }
}

/// Render records as a plain text table
pub fn render_table(records: &[BackupRecord]) -> String {
    let mut table = Table::new(records);
    table.with(Style::psql());
    table.to_string()
}
