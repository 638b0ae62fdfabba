//! Shared sync pipeline entrypoint used by the `sync` and `diff` commands.
//!
//! A run executes the related-realms pass and then the password-rules pass.
//! The first error aborts whatever has not run yet; a pass that already
//! completed keeps its writes.

use std::path::Path;

use credsync_core::{
    CollectionId, CollectionMetadata, PasswordRuleRecord, RealmGroup, RelatedRealmsRecord,
};

use crate::realms::{self, RealmsAction, StoredRealms};
use crate::rules;
use crate::source::{password_rules_with_legacy, SourceFeed};
use crate::store::{BatchOperation, RecordStore};
use crate::SyncError;

/// Which passes a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassScope {
    #[default]
    All,
    RelatedRealms,
    PasswordRules,
}

impl PassScope {
    fn includes(self, kind: PassKind) -> bool {
        match self {
            PassScope::All => true,
            PassScope::RelatedRealms => kind == PassKind::RelatedRealms,
            PassScope::PasswordRules => kind == PassKind::PasswordRules,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions<'a> {
    pub scope: PassScope,
    pub legacy_rules_path: Option<&'a Path>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    RelatedRealms,
    PasswordRules,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub kind: PassKind,
    pub collection: CollectionId,
    pub creates: usize,
    pub updates: usize,
    /// Writes the store accepted.
    pub applied: usize,
    pub marked_for_review: bool,
}

impl PassReport {
    fn new(kind: PassKind, collection: CollectionId) -> Self {
        Self {
            kind,
            collection,
            creates: 0,
            updates: 0,
            applied: 0,
            marked_for_review: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub passes: Vec<PassReport>,
}

impl RunReport {
    pub fn total_applied(&self) -> usize {
        self.passes.iter().map(|p| p.applied).sum()
    }
}

/// Run every pass `options.scope` selects, in fixed order.
pub fn run<F: SourceFeed, S: RecordStore>(
    feed: &F,
    store: &S,
    options: &RunOptions<'_>,
) -> Result<RunReport, SyncError> {
    let mut report = RunReport::default();
    if options.scope.includes(PassKind::RelatedRealms) {
        report.passes.push(sync_related_realms(feed, store)?);
    }
    if options.scope.includes(PassKind::PasswordRules) {
        report
            .passes
            .push(sync_password_rules(feed, store, options.legacy_rules_path)?);
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Related realms
// ---------------------------------------------------------------------------

/// Current record, source list, and the action reconciling them.
#[derive(Debug, Clone)]
pub struct RealmsPlan {
    pub current: Option<StoredRealms>,
    pub source: Vec<RealmGroup>,
    pub action: RealmsAction,
}

pub fn plan_related_realms<F: SourceFeed, S: RecordStore>(
    feed: &F,
    store: &S,
) -> Result<RealmsPlan, SyncError> {
    let collection = CollectionId::related_realms();
    let source = feed.related_realms()?;
    let records = store.list_records::<RelatedRealmsRecord>(&collection)?;
    let current = realms::canonical_record(&collection, records)?;
    let action = realms::reconcile(&source, current.as_ref());
    Ok(RealmsPlan {
        current,
        source,
        action,
    })
}

pub fn sync_related_realms<F: SourceFeed, S: RecordStore>(
    feed: &F,
    store: &S,
) -> Result<PassReport, SyncError> {
    let collection = CollectionId::related_realms();
    let plan = plan_related_realms(feed, store)?;
    let mut report = PassReport::new(PassKind::RelatedRealms, collection.clone());

    let Some(record) = plan.action.record() else {
        tracing::info!(collection = %collection, "no new records; not committing any changes");
        return Ok(report);
    };

    match plan.action {
        RealmsAction::Create { .. } => {
            let id = store.create_record(&collection, &record)?;
            report.creates = 1;
            tracing::info!(collection = %collection, id = %id, "added new related-realms record");
        }
        RealmsAction::Update { .. } => {
            store.update_record(&collection, &record)?;
            report.updates = 1;
            tracing::info!(
                collection = %collection,
                groups = record.related_realms.len(),
                "replaced related-realms record"
            );
        }
        RealmsAction::NoOp => {}
    }
    report.applied = 1;

    mark_for_review(store, &collection)?;
    report.marked_for_review = true;
    Ok(report)
}

// ---------------------------------------------------------------------------
// Password rules
// ---------------------------------------------------------------------------

pub fn plan_password_rules<F: SourceFeed, S: RecordStore>(
    feed: &F,
    store: &S,
    legacy_rules_path: Option<&Path>,
) -> Result<Vec<BatchOperation<PasswordRuleRecord>>, SyncError> {
    let collection = CollectionId::password_rules();
    let source = password_rules_with_legacy(feed, legacy_rules_path)?;
    let destination = store.list_records::<PasswordRuleRecord>(&collection)?;
    rules::reconcile(&collection, &source, &destination)
}

pub fn sync_password_rules<F: SourceFeed, S: RecordStore>(
    feed: &F,
    store: &S,
    legacy_rules_path: Option<&Path>,
) -> Result<PassReport, SyncError> {
    let collection = CollectionId::password_rules();
    let operations = plan_password_rules(feed, store, legacy_rules_path)?;
    let mut report = PassReport::new(PassKind::PasswordRules, collection.clone());

    if operations.is_empty() {
        tracing::info!(collection = %collection, "no new records; not committing any changes");
        return Ok(report);
    }

    let (creates, updates) = rules::tally(&operations);
    report.creates = creates;
    report.updates = updates;

    let outcome = store.batch(&collection, &operations)?;
    report.applied = outcome.applied;
    tracing::info!(
        collection = %collection,
        creates,
        updates,
        applied = outcome.applied,
        rejected = outcome.rejected.len(),
        "submitted password-rules batch"
    );

    if outcome.applied > 0 {
        mark_for_review(store, &collection)?;
        report.marked_for_review = true;
    }

    if let Some(first) = outcome.rejected.first() {
        let domain = operations
            .get(first.index)
            .map(|op| op.record().domain.to_string())
            .unwrap_or_default();
        return Err(SyncError::PartialBatch {
            collection,
            applied: outcome.applied,
            failed: outcome.rejected.len(),
            first: match first.status {
                0 => format!("{domain} (no response): {}", first.message),
                status => format!("{domain} (HTTP {status}): {}", first.message),
            },
        });
    }

    Ok(report)
}

// ---------------------------------------------------------------------------
// Review status
// ---------------------------------------------------------------------------

/// Flag `collection` as awaiting review.
///
/// The current `last_modified` is read and echoed back in the patch; a
/// concurrent change is not retried.
pub fn mark_for_review<S: RecordStore>(
    store: &S,
    collection: &CollectionId,
) -> Result<(), SyncError> {
    let current = store.collection_metadata(collection)?;
    store.patch_metadata(
        collection,
        &CollectionMetadata::review_patch(current.last_modified),
    )?;
    tracing::info!(collection = %collection, "collection status set to to-review");
    Ok(())
}
