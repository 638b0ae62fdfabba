//! `credsync sync` — reconcile both collections against the source datasets.

use anyhow::{Context, Result};
use clap::Args;
use credsync_sync::{
    pipeline::{self, RunOptions},
    DryRunStore, PassKind, PassReport, RunReport,
};

use crate::PassArg;

/// Arguments for `credsync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Run a single pass: `realms` or `rules`.
    #[arg(long)]
    pub only: Option<PassArg>,

    /// Show what would be written without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let session = super::connect()?;
        let options = RunOptions {
            scope: self.only.map(Into::into).unwrap_or_default(),
            legacy_rules_path: session.config.legacy_rules_path.as_deref(),
        };

        let report = if self.dry_run {
            let dry = DryRunStore::new(&session.store);
            let report = pipeline::run(&session.feed, &dry, &options).context("sync failed")?;
            tracing::debug!(writes = dry.writes().len(), "dry-run complete");
            report
        } else {
            pipeline::run(&session.feed, &session.store, &options).context("sync failed")?
        };

        print_report(&report, self.dry_run);
        Ok(())
    }
}

fn print_report(report: &RunReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    for pass in &report.passes {
        print_pass(pass, prefix);
    }
    println!("{prefix}Script finished successfully!");
}

fn print_pass(pass: &PassReport, prefix: &str) {
    let label = match pass.kind {
        PassKind::RelatedRealms => "related realms",
        PassKind::PasswordRules => "password rules",
    };
    if pass.creates + pass.updates == 0 {
        println!("{prefix}✓ {label} ('{}') — nothing to do", pass.collection);
        return;
    }
    println!(
        "{prefix}✓ {label} ('{}') — {} created, {} updated",
        pass.collection, pass.creates, pass.updates
    );
    if pass.marked_for_review {
        println!("  ⚑  status set to to-review");
    }
}
