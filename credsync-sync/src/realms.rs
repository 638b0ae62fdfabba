//! Related-realms reconciliation.
//!
//! The collection holds a single record whose `relatedRealms` list is
//! replaced wholesale whenever it differs from the source.

use credsync_core::{CollectionId, RealmGroup, RecordId, RelatedRealmsRecord};

use crate::diff::realms_are_stale;
use crate::SyncError;

/// What a pass must do to the related-realms record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealmsAction {
    /// No record exists yet.
    Create { related_realms: Vec<RealmGroup> },
    /// The record exists and is stale; replace its whole list.
    Update {
        id: RecordId,
        related_realms: Vec<RealmGroup>,
    },
    NoOp,
}

impl RealmsAction {
    /// The record to send to the store, if any.
    pub fn record(&self) -> Option<RelatedRealmsRecord> {
        match self {
            RealmsAction::Create { related_realms } => {
                Some(RelatedRealmsRecord::new(related_realms.clone()))
            }
            RealmsAction::Update { id, related_realms } => Some(RelatedRealmsRecord {
                id: Some(id.clone()),
                related_realms: related_realms.clone(),
            }),
            RealmsAction::NoOp => None,
        }
    }
}

/// The related-realms record as the store holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRealms {
    pub id: RecordId,
    pub related_realms: Vec<RealmGroup>,
}

/// Decide the action for `source` against the current destination record.
pub fn reconcile(source: &[RealmGroup], destination: Option<&StoredRealms>) -> RealmsAction {
    let Some(record) = destination else {
        return RealmsAction::Create {
            related_realms: source.to_vec(),
        };
    };

    if realms_are_stale(source, &record.related_realms) {
        RealmsAction::Update {
            id: record.id.clone(),
            related_realms: source.to_vec(),
        }
    } else {
        RealmsAction::NoOp
    }
}

/// Pick the one related-realms record from a collection listing.
///
/// More than one record, or a record without an id, is a data-integrity
/// error rather than a choice.
pub fn canonical_record(
    collection: &CollectionId,
    mut records: Vec<RelatedRealmsRecord>,
) -> Result<Option<StoredRealms>, SyncError> {
    if records.len() > 1 {
        return Err(SyncError::DuplicateRealmsRecord {
            collection: collection.clone(),
            count: records.len(),
        });
    }
    let Some(record) = records.pop() else {
        return Ok(None);
    };
    let Some(id) = record.id else {
        return Err(SyncError::MissingRecordId {
            collection: collection.clone(),
            record: "related-realms record".to_string(),
        });
    };
    Ok(Some(StoredRealms {
        id,
        related_realms: record.related_realms,
    }))
}
