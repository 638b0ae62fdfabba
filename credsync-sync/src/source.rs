//! Source dataset seam.

use std::path::Path;

use credsync_core::{config::load_legacy_rules, PasswordRules, RealmGroup};

use crate::SyncError;

/// Read access to the authoritative datasets.
pub trait SourceFeed {
    fn related_realms(&self) -> Result<Vec<RealmGroup>, SyncError>;

    fn password_rules(&self) -> Result<PasswordRules, SyncError>;
}

/// Source password rules, with legacy-only domains from `legacy_path`
/// appended after the feed's own entries.
pub fn password_rules_with_legacy<F: SourceFeed>(
    feed: &F,
    legacy_path: Option<&Path>,
) -> Result<PasswordRules, SyncError> {
    let mut rules = feed.password_rules()?;
    if let Some(path) = legacy_path {
        let legacy = load_legacy_rules(path)?;
        let before = rules.len();
        rules.merge_missing_from(legacy);
        tracing::info!(
            path = %path.display(),
            added = rules.len() - before,
            "merged legacy password rules"
        );
    }
    Ok(rules)
}
