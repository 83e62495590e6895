//! Configuration module for intune-backup
//!
//! This module provides configuration management including:
//! - Output tree path resolution
//! - Settings loaded from a JSON config file and overridden from the CLI

pub mod paths;
pub mod settings;

pub use paths::BackupPaths;
pub use settings::{ApiVersion, Settings};
