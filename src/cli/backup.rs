//! Backup command
//!
//! Bridges the parsed arguments to settings, sign-in, and the orchestrator.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::Args;
use zeroize::Zeroizing;

use crate::backup::{
    establish_session, BackupOptions, BackupOrchestrator, BackupSummary, FailurePolicy, CATEGORIES,
};
use crate::config::{ApiVersion, BackupPaths, Settings};
use crate::error::{BackupError, BackupResult};
use crate::export::render_table;
use crate::graph::{
    Authenticator, ClientCredentialsAuthenticator, GraphClient, SessionManager,
    StaticTokenAuthenticator,
};

/// Arguments of a backup run
#[derive(Args, Debug)]
pub struct BackupArgs {
    /// Output directory for the backup tree (created if absent)
    #[arg(required_unless_present = "list_categories")]
    pub path: Option<PathBuf>,

    /// Graph API version
    #[arg(long, value_enum, env = "INTUNE_BACKUP_API_VERSION")]
    pub api_version: Option<ApiVersion>,

    /// Settings file (defaults to the platform config directory)
    #[arg(long, env = "INTUNE_BACKUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory (tenant) ID for client-credentials sign-in
    #[arg(long, env = "INTUNE_BACKUP_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Application (client) ID for client-credentials sign-in
    #[arg(long, env = "INTUNE_BACKUP_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Client secret; prompted for when missing and a terminal is attached
    #[arg(long, env = "INTUNE_BACKUP_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Pre-issued access token, used instead of client credentials
    #[arg(long, env = "INTUNE_BACKUP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Stop at the first category that fails
    #[arg(long)]
    pub fail_fast: bool,

    /// Only back up this category (label or folder name); repeatable
    #[arg(long = "category", value_name = "NAME")]
    pub categories: Vec<String>,

    /// Page size requested for collection reads
    #[arg(long, value_name = "N")]
    pub page_size: Option<u32>,

    /// Print records as JSON lines instead of a table
    #[arg(long)]
    pub json: bool,

    /// List the exported categories and exit
    #[arg(long)]
    pub list_categories: bool,
}

impl BackupArgs {
    /// Overlay command-line values onto file settings
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(version) = self.api_version {
            settings.api_version = version;
        }
        if let Some(tenant) = &self.tenant_id {
            settings.tenant_id = Some(tenant.clone());
        }
        if let Some(client) = &self.client_id {
            settings.client_id = Some(client.clone());
        }
        if self.page_size.is_some() {
            settings.page_size = self.page_size;
        }
        settings.fail_fast |= self.fail_fast;
    }
}

/// Print the category table
pub fn print_categories() {
    println!("Exported categories");
    println!("===================");
    for category in CATEGORIES {
        let beta = if category.beta_only { " [Beta only]" } else { "" };
        println!("  {:<32} -> {}{}", category.label, category.folder, beta);
    }
}

/// Handle a backup run
pub fn handle_backup(args: BackupArgs) -> BackupResult<BackupSummary> {
    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply_to(&mut settings);

    let root = args
        .path
        .clone()
        .ok_or_else(|| BackupError::Config("An output path is required".into()))?;

    let mut sessions = SessionManager::new(build_authenticator(&args, &settings)?);
    let session = establish_session(&mut sessions)?;
    let client = GraphClient::new(&settings, session)?;

    let paths = BackupPaths::new(root);
    let options = BackupOptions {
        api_version: settings.api_version,
        policy: if settings.fail_fast {
            FailurePolicy::FailFast
        } else {
            FailurePolicy::Isolate
        },
        page_size: settings.page_size,
        only: args.categories.clone(),
    };

    tracing::info!(
        path = %paths.root().display(),
        version = %settings.api_version,
        "Starting backup"
    );
    let summary = BackupOrchestrator::new(&client, &paths, options).run()?;

    print_summary(&summary, args.json)?;
    Ok(summary)
}

/// Pick a token source: explicit access token, else client credentials
fn build_authenticator(args: &BackupArgs, settings: &Settings) -> BackupResult<Box<dyn Authenticator>> {
    if let Some(token) = &args.access_token {
        return Ok(Box::new(StaticTokenAuthenticator::new(token.as_str())));
    }

    if settings.tenant_id.is_none() || settings.client_id.is_none() {
        return Err(BackupError::Config(
            "No credentials: set INTUNE_BACKUP_ACCESS_TOKEN, or a tenant ID and client ID".into(),
        ));
    }

    let secret = match &args.client_secret {
        Some(secret) => Zeroizing::new(secret.clone()),
        None if std::io::stdin().is_terminal() => Zeroizing::new(
            rpassword::prompt_password("Client secret: ")
                .map_err(|e| BackupError::Config(format!("Failed to read client secret: {}", e)))?,
        ),
        None => {
            return Err(BackupError::Config(
                "No client secret: set INTUNE_BACKUP_CLIENT_SECRET".into(),
            ))
        }
    };

    Ok(Box::new(ClientCredentialsAuthenticator::from_settings(settings, secret)?))
}

fn print_summary(summary: &BackupSummary, json: bool) -> BackupResult<()> {
    if json {
        for record in &summary.records {
            println!("{}", serde_json::to_string(record)?);
        }
    } else if summary.records.is_empty() {
        println!("No objects were exported.");
    } else {
        println!("{}", render_table(&summary.records));
        println!();
        println!("Total: {} file(s)", summary.records.len());
    }

    if !summary.unreadable.is_empty() {
        eprintln!(
            "{} encrypted setting(s) could not be read and were exported with a placeholder value:",
            summary.unreadable.len()
        );
        for secret in &summary.unreadable {
            eprintln!(
                "  {} {} (reference {})",
                secret.object_name, secret.oma_uri, secret.secret_reference_id
            );
        }
    }

    if !summary.skipped.is_empty() {
        eprintln!(
            "Skipped (not available in this API version): {}",
            summary.skipped.join(", ")
        );
    }

    for failure in &summary.failures {
        eprintln!("FAILED: {}", failure.error);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: BackupArgs,
    }

    #[test]
    fn test_overrides_apply() {
        let cli = TestCli::parse_from([
            "test",
            "/tmp/out",
            "--api-version",
            "v1.0",
            "--tenant-id",
            "contoso",
            "--fail-fast",
            "--category",
            "Client Apps",
        ]);

        let mut settings = Settings::default();
        cli.args.apply_to(&mut settings);

        assert_eq!(settings.api_version, ApiVersion::V1);
        assert_eq!(settings.tenant_id.as_deref(), Some("contoso"));
        assert!(settings.fail_fast);
        assert_eq!(cli.args.categories, vec!["Client Apps"]);
    }

    #[test]
    fn test_file_settings_kept_without_flags() {
        let cli = TestCli::parse_from(["test", "/tmp/out"]);

        let mut settings = Settings {
            fail_fast: true,
            page_size: Some(100),
            ..Settings::default()
        };
        cli.args.apply_to(&mut settings);

        assert!(settings.fail_fast);
        assert_eq!(settings.page_size, Some(100));
    }
}
