//! Writes fetched objects to the backup tree
//!
//! Layout for a category folder `F`:
//!
//! ```text
//! F/<name>.json                  one file per object
//! F/Assignments/<name>.json      the object's assignments, when it has any
//! F/Script Content/<file>.ps1    decoded script bodies
//! ```
//!
//! Folders are created on first write only, so a category with nothing to
//! export leaves no trace in the tree.

use std::path::Path;

use serde_json::Value;

use super::file_io::{write_bytes, write_json_pretty};
use super::pagination::fetch_all;
use super::record::BackupRecord;
use super::sanitize::{display_name, sanitize_file_name};
use super::transform::Transform;
use crate::config::BackupPaths;
use crate::error::BackupResult;
use crate::graph::GraphApi;
use crate::secrets::{SecretResolver, UnreadableSecret, WarningLog};

/// Sub-folder holding assignment exports
pub const ASSIGNMENTS_FOLDER: &str = "Assignments";

/// Sub-folder holding decoded scripts
pub const SCRIPT_CONTENT_FOLDER: &str = "Script Content";

/// What one export call produced
#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub records: Vec<BackupRecord>,
    pub unreadable: Vec<UnreadableSecret>,
}

/// An object whose assignments should be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentTarget {
    /// Display name of the parent object
    pub name: String,
    /// Assignments collection URL
    pub url: String,
}

/// Exports objects of one category at a time
pub struct Exporter<'a, A: ?Sized> {
    api: &'a A,
    paths: &'a BackupPaths,
    resolver: SecretResolver<'a>,
}

impl<'a, A> Exporter<'a, A>
where
    A: GraphApi + ?Sized,
{
    pub fn new(api: &'a A, paths: &'a BackupPaths, warnings: &'a WarningLog) -> Self {
        Self {
            api,
            paths,
            resolver: SecretResolver::new(warnings),
        }
    }

    /// Write every object of a category to `<root>/<folder>/<name>.json`
    ///
    /// `kind` labels the emitted records and `collection` is the path the
    /// objects were read from. Objects sharing a sanitized name overwrite each
    /// other; the last one wins. Records are pushed to `outcome` as each file
    /// lands, so it still lists what was written when an error cuts the
    /// category short.
    pub fn export_objects(
        &self,
        kind: &str,
        folder: &str,
        collection: &str,
        objects: Vec<Value>,
        transform: Transform,
        outcome: &mut ExportOutcome,
    ) -> BackupResult<()> {
        if objects.is_empty() {
            tracing::debug!(kind, "Nothing to export");
            return Ok(());
        }

        let collection = collection_base(collection);
        let script_folder = format!("{}/{}", folder, SCRIPT_CONTENT_FOLDER);

        for mut object in objects {
            let name = display_name(&object);
            let stem = sanitize_file_name(&name);

            let side = transform.apply(self.api, &self.resolver, collection, &stem, &mut object)?;

            let path = self.paths.object_file(folder, &stem);
            write_json_pretty(&path, &object)?;
            outcome.records.push(self.record(kind, &name, &path));
            outcome.unreadable.extend(side.unreadable);

            for attachment in side.attachments {
                let path = self
                    .paths
                    .category_dir(&script_folder)
                    .join(&attachment.file_name);
                write_bytes(&path, &attachment.contents)?;
                outcome.records.push(self.record(kind, &name, &path));
            }
        }

        Ok(())
    }

    /// Write each target's assignments to `<root>/<folder>/Assignments/<name>.json`
    ///
    /// Targets without assignments are skipped.
    pub fn export_assignments(
        &self,
        kind: &str,
        folder: &str,
        targets: &[AssignmentTarget],
        outcome: &mut ExportOutcome,
    ) -> BackupResult<()> {
        let assignments_folder = format!("{}/{}", folder, ASSIGNMENTS_FOLDER);

        for target in targets {
            let assignments = fetch_all(self.api, &target.url, None)?;
            if assignments.is_empty() {
                tracing::debug!(name = %target.name, "No assignments");
                continue;
            }

            let path = self
                .paths
                .object_file(&assignments_folder, &sanitize_file_name(&target.name));
            write_json_pretty(&path, &assignments)?;
            outcome.records.push(self.record(kind, &target.name, &path));
        }

        Ok(())
    }

    fn record(&self, kind: &str, name: &str, path: &Path) -> BackupRecord {
        let record = BackupRecord::new(kind, name, self.paths.relative(path).display().to_string());
        record.emit();
        record
    }
}

/// Collection path without its query string
pub fn collection_base(collection: &str) -> &str {
    collection.split('?').next().unwrap_or(collection)
}
