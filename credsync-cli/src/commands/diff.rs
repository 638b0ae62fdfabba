//! `credsync diff` — show what `sync` would change, without writing.

use anyhow::{Context, Result};
use clap::Args;

use credsync_sync::{diff::unified_realms_diff, pipeline, BatchOperation, RealmsAction};

/// Arguments for `credsync diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let session = super::connect()?;

        let plan = pipeline::plan_related_realms(&session.feed, &session.store)
            .context("failed to plan related realms")?;
        match &plan.action {
            RealmsAction::NoOp => println!("No differences for related realms."),
            RealmsAction::Create { related_realms } => println!(
                "related realms: no record yet; sync would create one with {} group(s)",
                related_realms.len()
            ),
            RealmsAction::Update { .. } => {
                let current = plan
                    .current
                    .as_ref()
                    .map(|r| r.related_realms.as_slice())
                    .unwrap_or_default();
                let diff = unified_realms_diff(current, &plan.source)?;
                print!("{diff}");
                if !diff.ends_with('\n') {
                    println!();
                }
            }
        }

        let operations = pipeline::plan_password_rules(
            &session.feed,
            &session.store,
            session.config.legacy_rules_path.as_deref(),
        )
        .context("failed to plan password rules")?;
        if operations.is_empty() {
            println!("No differences for password rules.");
            return Ok(());
        }
        for op in &operations {
            let record = op.record();
            match op {
                BatchOperation::Create(_) => {
                    println!("  +  {}  {}", record.domain, record.rules)
                }
                BatchOperation::Update(_) => {
                    println!("  ~  {}  {}", record.domain, record.rules)
                }
            }
        }
        Ok(())
    }
}
