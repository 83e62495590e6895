use anyhow::{bail, Result};
use clap::Parser;

use intune_backup::cli::{handle_backup, print_categories, BackupArgs};
use intune_backup::logging::setup_logging;

#[derive(Parser)]
#[command(
    name = "intune-backup",
    version,
    about = "Back up Intune tenant configuration to a tree of JSON files",
    long_about = "intune-backup exports the configuration of an Intune tenant \
                  (policies, profiles, scripts, apps, and their assignments) to \
                  one JSON file per object, grouped into one folder per category."
)]
struct Cli {
    #[command(flatten)]
    backup: BackupArgs,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.backup.list_categories {
        print_categories();
        return Ok(());
    }

    setup_logging(cli.verbose)?;

    let summary = handle_backup(cli.backup)?;
    if !summary.is_success() {
        bail!("{} category export(s) failed", summary.failures.len());
    }

    Ok(())
}
