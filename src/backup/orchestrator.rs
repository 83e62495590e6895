//! Runs every category against one authenticated session

use crate::config::{ApiVersion, BackupPaths};
use crate::error::{BackupError, BackupResult};
use crate::export::exporter::AssignmentTarget;
use crate::export::{fetch_all, BackupRecord, ExportOutcome, Exporter};
use crate::graph::{Authenticator, GraphApi, Session, SessionManager, REQUIRED_SCOPES};
use crate::secrets::{UnreadableSecret, WarningLog};

use super::categories::{find_category, Category, CATEGORIES};

/// What happens to the run when a category fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure, keep exporting the remaining categories
    #[default]
    Isolate,
    /// Stop at the first failed category
    FailFast,
}

/// Options for a backup run
#[derive(Debug, Clone, Default)]
pub struct BackupOptions {
    pub api_version: ApiVersion,
    pub policy: FailurePolicy,
    /// Requested page size for top-level collections
    pub page_size: Option<u32>,
    /// Restrict the run to these categories (label or folder); empty means all
    pub only: Vec<String>,
}

/// A category that could not be exported
#[derive(Debug)]
pub struct CategoryFailure {
    pub category: &'static str,
    pub error: BackupError,
}

/// Result of a completed run
#[derive(Debug, Default)]
pub struct BackupSummary {
    pub records: Vec<BackupRecord>,
    pub failures: Vec<CategoryFailure>,
    /// Settings exported with the unreadable-value sentinel
    pub unreadable: Vec<UnreadableSecret>,
    /// Categories not available in the selected API version
    pub skipped: Vec<&'static str>,
}

impl BackupSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Establish a session holding every scope the categories need
pub fn establish_session<A: Authenticator>(manager: &mut SessionManager<A>) -> BackupResult<&Session> {
    manager.ensure_authenticated(REQUIRED_SCOPES)
}

/// Exports the category table in order
pub struct BackupOrchestrator<'a, A: ?Sized> {
    api: &'a A,
    paths: &'a BackupPaths,
    options: BackupOptions,
}

impl<'a, A> BackupOrchestrator<'a, A>
where
    A: GraphApi + ?Sized,
{
    pub fn new(api: &'a A, paths: &'a BackupPaths, options: BackupOptions) -> Self {
        Self { api, paths, options }
    }

    /// Categories selected by the options, in table order
    pub fn selected_categories(&self) -> BackupResult<Vec<&'static Category>> {
        if self.options.only.is_empty() {
            return Ok(CATEGORIES.iter().collect());
        }

        for name in &self.options.only {
            if find_category(name).is_none() {
                return Err(BackupError::Config(format!("Unknown category: {}", name)));
            }
        }

        Ok(CATEGORIES
            .iter()
            .filter(|c| self.options.only.iter().any(|name| c.matches(name)))
            .collect())
    }

    /// Run the backup
    ///
    /// Returns `Err` for configuration errors, filesystem errors, and under
    /// `FailFast` for the first failed category. Under `Isolate` other failures
    /// are collected in the summary.
    pub fn run(&self) -> BackupResult<BackupSummary> {
        let categories = self.selected_categories()?;
        self.paths.ensure_root()?;

        let warnings = WarningLog::new(self.paths.warnings_file());
        let exporter = Exporter::new(self.api, self.paths, &warnings);
        let mut summary = BackupSummary::default();

        for category in categories {
            if !category.available_in(self.options.api_version) {
                tracing::info!(
                    category = category.label,
                    version = %self.options.api_version,
                    "Skipping category not served by this API version"
                );
                summary.skipped.push(category.label);
                continue;
            }

            tracing::info!(category = category.label, "Backing up");
            match self.export_category(&exporter, category, &mut summary) {
                Ok(written) => {
                    tracing::info!(category = category.label, files = written, "Category complete");
                }
                Err(err) => {
                    let err = BackupError::in_category(category.label, err);
                    if err.is_fatal() || self.options.policy == FailurePolicy::FailFast {
                        return Err(err);
                    }
                    tracing::error!(error = %err, "Category failed; continuing");
                    summary.failures.push(CategoryFailure {
                        category: category.label,
                        error: err,
                    });
                }
            }
        }

        if !summary.unreadable.is_empty() {
            tracing::warn!(
                count = summary.unreadable.len(),
                log = %warnings.path().display(),
                "Encrypted settings exported with a placeholder value"
            );
        }

        Ok(summary)
    }

    /// Export one category and its assignments, returning the number of files written
    ///
    /// Files written before a failure are still added to the summary.
    fn export_category(
        &self,
        exporter: &Exporter<'_, A>,
        category: &Category,
        summary: &mut BackupSummary,
    ) -> BackupResult<usize> {
        let mut outcome = ExportOutcome::default();
        let result = self.export_into(exporter, category, &mut outcome);

        let written = outcome.records.len();
        summary.records.extend(outcome.records);
        summary.unreadable.extend(outcome.unreadable);

        result.map(|()| written)
    }

    fn export_into(
        &self,
        exporter: &Exporter<'_, A>,
        category: &Category,
        outcome: &mut ExportOutcome,
    ) -> BackupResult<()> {
        let objects = fetch_all(self.api, category.collection, self.options.page_size)?;

        let targets: Vec<AssignmentTarget> = objects
            .iter()
            .filter_map(|object| {
                category.assignments_url(object).map(|url| AssignmentTarget {
                    name: crate::export::display_name(object),
                    url,
                })
            })
            .collect();

        exporter.export_objects(
            category.label,
            category.folder,
            category.collection,
            objects,
            category.transform,
            outcome,
        )?;
        exporter.export_assignments(&category.assignments_label(), category.folder, &targets, outcome)
    }
}
