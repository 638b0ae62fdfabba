//! Destination store seam.
//!
//! [`RecordStore`] is the record CRUD capability a reconciliation pass needs
//! from a Remote Settings style server. The HTTP implementation lives in the
//! binary; [`DryRunStore`] wraps any store and swallows its writes.

use std::cell::RefCell;

use serde::de::DeserializeOwned;
use serde::Serialize;

use credsync_core::{
    CollectionId, CollectionMetadata, PasswordRuleRecord, RecordId, RelatedRealmsRecord,
};

use crate::SyncError;

/// A record that can be written to the store.
pub trait StoreRecord: Serialize {
    /// Storage identity, present once the record exists in the store.
    fn record_id(&self) -> Option<&RecordId>;
}

impl StoreRecord for RelatedRealmsRecord {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

impl StoreRecord for PasswordRuleRecord {
    fn record_id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

/// One write of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOperation<R> {
    Create(R),
    /// The record must carry its existing id.
    Update(R),
}

impl<R> BatchOperation<R> {
    pub fn record(&self) -> &R {
        match self {
            BatchOperation::Create(r) | BatchOperation::Update(r) => r,
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, BatchOperation::Create(_))
    }
}

/// A batch operation the store refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRejection {
    /// Position of the operation in the submitted slice.
    pub index: usize,
    /// HTTP status of the sub-response; 0 when the operation's request never
    /// got an answer.
    pub status: u16,
    pub message: String,
}

/// Result of a batch submission. Operations not listed in `rejected` were
/// applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub applied: usize,
    pub rejected: Vec<BatchRejection>,
}

impl BatchOutcome {
    pub fn all_applied(count: usize) -> Self {
        Self {
            applied: count,
            rejected: Vec::new(),
        }
    }
}

/// Record CRUD against named collections of one bucket.
pub trait RecordStore {
    fn list_records<R: DeserializeOwned>(
        &self,
        collection: &CollectionId,
    ) -> Result<Vec<R>, SyncError>;

    /// Create a record and return the id the store assigned.
    fn create_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<RecordId, SyncError>;

    fn update_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<(), SyncError>;

    /// Submit several writes at once. A store that rejects individual
    /// operations reports them in the outcome. Transport failure before
    /// anything was applied is an `Err`; once some writes have been applied,
    /// the operations left unconfirmed are reported as rejections instead so
    /// the caller still sees the applied count.
    fn batch<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        operations: &[BatchOperation<R>],
    ) -> Result<BatchOutcome, SyncError>;

    fn collection_metadata(&self, collection: &CollectionId)
        -> Result<CollectionMetadata, SyncError>;

    /// Merge `patch` into the collection metadata.
    fn patch_metadata(
        &self,
        collection: &CollectionId,
        patch: &CollectionMetadata,
    ) -> Result<(), SyncError>;
}

// ---------------------------------------------------------------------------
// Dry run
// ---------------------------------------------------------------------------

/// A write that [`DryRunStore`] intercepted.
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedWrite {
    pub collection: CollectionId,
    pub method: &'static str,
    pub payload: serde_json::Value,
}

/// Forwards reads to `inner` and records writes without sending them.
pub struct DryRunStore<'a, S> {
    inner: &'a S,
    writes: RefCell<Vec<InterceptedWrite>>,
}

impl<'a, S: RecordStore> DryRunStore<'a, S> {
    pub fn new(inner: &'a S) -> Self {
        Self {
            inner,
            writes: RefCell::new(Vec::new()),
        }
    }

    /// Every write intercepted so far, in call order.
    pub fn writes(&self) -> Vec<InterceptedWrite> {
        self.writes.borrow().clone()
    }

    fn intercept<T: Serialize>(
        &self,
        collection: &CollectionId,
        method: &'static str,
        payload: &T,
    ) -> Result<(), SyncError> {
        let payload = serde_json::to_value(payload)?;
        tracing::debug!(collection = %collection, method, "dry-run: write intercepted");
        self.writes.borrow_mut().push(InterceptedWrite {
            collection: collection.clone(),
            method,
            payload,
        });
        Ok(())
    }
}

impl<S: RecordStore> RecordStore for DryRunStore<'_, S> {
    fn list_records<R: DeserializeOwned>(
        &self,
        collection: &CollectionId,
    ) -> Result<Vec<R>, SyncError> {
        self.inner.list_records(collection)
    }

    fn create_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<RecordId, SyncError> {
        self.intercept(collection, "POST", record)?;
        Ok(RecordId::from("dry-run"))
    }

    fn update_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<(), SyncError> {
        self.intercept(collection, "PUT", record)
    }

    fn batch<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        operations: &[BatchOperation<R>],
    ) -> Result<BatchOutcome, SyncError> {
        for op in operations {
            let method = if op.is_create() { "POST" } else { "PUT" };
            self.intercept(collection, method, op.record())?;
        }
        Ok(BatchOutcome::all_applied(operations.len()))
    }

    fn collection_metadata(
        &self,
        collection: &CollectionId,
    ) -> Result<CollectionMetadata, SyncError> {
        self.inner.collection_metadata(collection)
    }

    fn patch_metadata(
        &self,
        collection: &CollectionId,
        patch: &CollectionMetadata,
    ) -> Result<(), SyncError> {
        self.intercept(collection, "PATCH", patch)
    }
}
