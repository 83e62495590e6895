//! intune-backup - export Intune tenant configuration to JSON files
//!
//! This library provides the export pipeline behind the `intune-backup`
//! binary: every category of management object is read page by page from
//! the Graph API and written as one pretty-printed JSON file per object.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Settings and output tree paths
//! - `error`: Custom error types
//! - `graph`: API client, sign-in state machine, token sources
//! - `export`: Paging, file name sanitizing, per-object transforms, file writing
//! - `secrets`: Decryption of encrypted OMA-URI settings
//! - `backup`: The category table and the orchestrator that runs it
//! - `cli`: Argument parsing and output
//! - `logging`: tracing subscriber setup
//!
//! # Example
//!
//! ```rust,ignore
//! use intune_backup::backup::{BackupOptions, BackupOrchestrator};
//! use intune_backup::config::BackupPaths;
//!
//! let paths = BackupPaths::new("./backup");
//! let summary = BackupOrchestrator::new(&client, &paths, BackupOptions::default()).run()?;
//! ```

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod logging;
pub mod secrets;

pub use error::BackupError;
