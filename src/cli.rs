use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::backlog::BacklogReader;
use crate::config::{self, AppConfig};
use crate::error::{Result, SyncError};
use crate::sync::journal::Journal;
use crate::sync::pacing::{Pacer, PacingConfig};
use crate::sync::{SyncPlan, SyncReport, Synchronizer};
use crate::tracker::{self, dry_run::DryRunTracker, TrackerClient};

/// Mirror BACKLOG.csv rows into GitHub issues, creating or updating by title.
#[derive(Parser, Debug)]
#[command(name = "backlog-sync", author, version, about, long_about = None)]
pub struct Cli {
    /// Backlog CSV to read (default: BACKLOG.csv in the current directory)
    #[arg(long, env = "BACKLOG_SYNC_CSV")]
    pub csv: Option<PathBuf>,

    /// Config file (default: ~/.backlog-sync/config.toml)
    #[arg(long, env = "BACKLOG_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Target repository as owner/name
    #[arg(long)]
    pub repo: Option<String>,

    /// Fixed pause between rows, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Look up issues but do not create or edit anything
    #[arg(long)]
    pub dry_run: bool,

    /// Start immediately instead of waiting for a chance to abort
    #[arg(short, long)]
    pub yes: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// No log output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    pub fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(csv) = &self.csv {
            config.csv = csv.clone();
        }
        if let Some(repo) = &self.repo {
            config.tracker.repo = Some(repo.clone());
        }
        if let Some(delay_ms) = self.delay_ms {
            config.pacing = PacingConfig::Fixed { delay_ms };
        }
        if self.dry_run {
            config.journal = false;
        }
        config
    }
}

pub async fn run(cli: &Cli) -> Result<SyncReport> {
    let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
    let config = cli.apply(config::load_config(&config_path)?);
    config.pacing.validate().map_err(SyncError::Config)?;

    let rows = BacklogReader::open(&config.csv)?;

    let mut tracker = tracker::create_tracker(&config.tracker)?;
    if cli.dry_run {
        tracker = Box::new(DryRunTracker::new(tracker));
    }

    intro(&config, tracker.as_ref(), cli.dry_run);
    if !cli.yes && config.grace_secs > 0 {
        tokio::time::sleep(Duration::from_secs(config.grace_secs)).await;
    }

    let mut sync = Synchronizer::new(tracker.as_ref(), Pacer::from_config(&config.pacing));
    if config.journal {
        sync = sync.with_journal(Journal::new(Journal::default_path()));
    }

    let label_available = sync.ensure_label(&config.label).await;
    let plan = SyncPlan {
        label: label_available.then(|| config.label.name.clone()),
        columns: rows.columns(),
        source_note: config.source_note.clone(),
    };

    let report = sync.run(&plan, rows).await?;
    println!(
        "Done: {} created, {} updated",
        report.created, report.updated
    );
    Ok(report)
}

fn intro(config: &AppConfig, tracker: &dyn TrackerClient, dry_run: bool) {
    let target = config.tracker.repo.as_deref().unwrap_or("the current repository");
    println!(
        "Syncing {} to {target} via {}{}",
        config.csv.display(),
        tracker.name(),
        if dry_run { " (dry run)" } else { "" }
    );
    println!("Press Ctrl+C now to abort.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("backlog-sync").chain(args.iter().copied()))
    }

    #[test]
    fn no_arguments_is_valid() {
        let cli = parse(&[]);
        assert!(cli.csv.is_none());
        assert!(!cli.dry_run);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn flags_override_config() {
        let cli = parse(&[
            "--csv",
            "docs/BACKLOG.csv",
            "--repo",
            "acme/widgets",
            "--delay-ms",
            "0",
            "--dry-run",
        ]);
        let config = cli.apply(AppConfig::default());
        assert_eq!(config.csv, PathBuf::from("docs/BACKLOG.csv"));
        assert_eq!(config.tracker.repo.as_deref(), Some("acme/widgets"));
        assert_eq!(config.pacing, PacingConfig::Fixed { delay_ms: 0 });
        assert!(!config.journal);
    }

    #[test]
    fn config_values_survive_without_flags() {
        let mut base = AppConfig::default();
        base.tracker.repo = Some("acme/widgets".into());
        let config = parse(&[]).apply(base);
        assert_eq!(config.tracker.repo.as_deref(), Some("acme/widgets"));
        assert!(config.journal);
    }

    #[test]
    fn verbosity_counts() {
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert!(parse(&["-q", "-y"]).yes);
    }
}
