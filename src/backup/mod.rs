//! Backup orchestration
//!
//! Signs in once, then exports every category of the fixed category table
//! through the shared export pipeline.

pub mod categories;
pub mod orchestrator;

pub use categories::{find_category, AssignmentSource, Category, CATEGORIES};
pub use orchestrator::{
    establish_session, BackupOptions, BackupOrchestrator, BackupSummary, CategoryFailure,
    FailurePolicy,
};
