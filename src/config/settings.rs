//! User settings for intune-backup
//!
//! Settings are read from a JSON config file (explicit `--config`, or the
//! platform config directory) and then overridden by command-line flags and
//! environment variables.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::BackupError;

/// Graph API version selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
pub enum ApiVersion {
    /// Stable `v1.0` endpoint
    #[serde(rename = "v1.0")]
    #[value(name = "v1.0")]
    V1,
    /// `beta` endpoint (default, exposes every category)
    #[default]
    #[serde(rename = "Beta", alias = "beta")]
    #[value(name = "Beta", alias = "beta")]
    Beta,
}

impl ApiVersion {
    /// URL path segment for this version
    pub fn path_segment(&self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1.0",
            ApiVersion::Beta => "beta",
        }
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiVersion::V1 => write!(f, "v1.0"),
            ApiVersion::Beta => write!(f, "Beta"),
        }
    }
}

/// Settings for a backup run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Graph API version
    #[serde(default)]
    pub api_version: ApiVersion,

    /// Graph endpoint root, without version
    #[serde(default = "default_graph_endpoint")]
    pub graph_endpoint: String,

    /// Identity platform authority root
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Directory (tenant) ID for client-credentials sign-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Application (client) ID for client-credentials sign-in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Stop the run at the first failed category
    #[serde(default)]
    pub fail_fast: bool,

    /// Requested page size (`$top`) for collection reads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

fn default_graph_endpoint() -> String {
    "https://graph.microsoft.com".to_string()
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_version: ApiVersion::default(),
            graph_endpoint: default_graph_endpoint(),
            authority: default_authority(),
            tenant_id: None,
            client_id: None,
            fail_fast: false,
            page_size: None,
        }
    }
}

impl Settings {
    /// Default config file location (`<config dir>/intune-backup/config.json`)
    pub fn default_config_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "intune-backup").map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load settings from an explicit file, the default file, or defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file silently yields default settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self, BackupError> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(BackupError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::load_file(path)
            }
            None => match Self::default_config_file() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a JSON file
    pub fn load_file(path: &Path) -> Result<Self, BackupError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        serde_json::from_str(&contents).map_err(|e| {
            BackupError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Base URL for versioned Graph requests, e.g. `https://graph.microsoft.com/beta`
    pub fn graph_base_url(&self) -> String {
        format!(
            "{}/{}",
            self.graph_endpoint.trim_end_matches('/'),
            self.api_version.path_segment()
        )
    }

    /// Token endpoint for the configured tenant
    pub fn token_url(&self) -> Result<String, BackupError> {
        let tenant = self.tenant_id.as_deref().ok_or_else(|| {
            BackupError::Config("A tenant ID is required for client-credentials sign-in".into())
        })?;
        Ok(format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority.trim_end_matches('/'),
            tenant
        ))
    }

    /// `.default` scope for the configured Graph endpoint
    pub fn default_scope(&self) -> String {
        format!("{}/.default", self.graph_endpoint.trim_end_matches('/'))
    }
}
