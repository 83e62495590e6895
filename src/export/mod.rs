//! Export pipeline shared by every category
//!
//! - `pagination`: reads every page of a collection
//! - `sanitize`: turns display names into file stems
//! - `transform`: per-object rewrites applied before writing
//! - `exporter`: writes one JSON file per object and emits `BackupRecord`s
//! - `file_io`: pretty JSON and raw file writes with temp-file + rename

pub mod exporter;
pub mod file_io;
pub mod pagination;
pub mod record;
pub mod sanitize;
pub mod transform;

pub use exporter::{ExportOutcome, Exporter};
pub use file_io::{read_json, write_bytes, write_json_pretty};
pub use pagination::fetch_all;
pub use record::{render_table, BackupRecord};
pub use sanitize::{display_name, sanitize_file_name};
pub use transform::{Attachment, ScriptKind, Transform};
