//! In-memory store and static feed shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::Value;

use credsync_core::{
    CollectionId, CollectionMetadata, CollectionStatus, PasswordRules, RealmGroup, RecordId,
};
use credsync_sync::{
    BatchOperation, BatchOutcome, BatchRejection, RecordStore, SourceFeed, StoreRecord, SyncError,
};

// ---------------------------------------------------------------------------
// Feed
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StaticFeed {
    pub realms: Vec<RealmGroup>,
    pub rules: PasswordRules,
    pub fail_rules: bool,
}

impl StaticFeed {
    pub fn new(realms: Vec<RealmGroup>, rules: PasswordRules) -> Self {
        Self {
            realms,
            rules,
            fail_rules: false,
        }
    }
}

impl SourceFeed for StaticFeed {
    fn related_realms(&self) -> Result<Vec<RealmGroup>, SyncError> {
        Ok(self.realms.clone())
    }

    fn password_rules(&self) -> Result<PasswordRules, SyncError> {
        if self.fail_rules {
            return Err(SyncError::Source {
                url: "https://source.test/password-rules.json".into(),
                message: "connection reset".into(),
            });
        }
        Ok(self.rules.clone())
    }
}

pub fn groups(raw: &[&[&str]]) -> Vec<RealmGroup> {
    raw.iter()
        .map(|g| g.iter().map(|s| s.to_string()).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Kinto-like store kept in memory. Every write bumps `last_modified`.
#[derive(Default)]
pub struct MemoryStore {
    records: RefCell<HashMap<String, Vec<Value>>>,
    metadata: RefCell<HashMap<String, CollectionMetadata>>,
    patches: RefCell<Vec<(String, CollectionMetadata)>>,
    next_id: Cell<usize>,
    clock: Cell<u64>,
    /// Domains whose batch operations the store rejects.
    pub reject_domains: RefCell<HashSet<String>>,
    /// Fail every batch call with a transport error.
    pub fail_batch: Cell<bool>,
    /// Lose the connection after applying this many batch operations.
    pub cut_batch_after: Cell<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed<R: serde::Serialize>(&self, collection: &CollectionId, record: &R) {
        let value = serde_json::to_value(record).expect("serialize seed");
        self.records
            .borrow_mut()
            .entry(collection.0.clone())
            .or_default()
            .push(value);
    }

    pub fn set_status(&self, collection: &CollectionId, status: CollectionStatus) {
        self.metadata
            .borrow_mut()
            .entry(collection.0.clone())
            .or_default()
            .status = Some(status);
    }

    pub fn records<R: DeserializeOwned>(&self, collection: &CollectionId) -> Vec<R> {
        self.list_records(collection).expect("list")
    }

    pub fn status(&self, collection: &CollectionId) -> Option<CollectionStatus> {
        self.metadata
            .borrow()
            .get(&collection.0)
            .and_then(|m| m.status.clone())
    }

    pub fn patches(&self) -> Vec<(String, CollectionMetadata)> {
        self.patches.borrow().clone()
    }

    fn touch(&self, collection: &CollectionId) {
        let now = self.clock.get() + 1;
        self.clock.set(now);
        self.metadata
            .borrow_mut()
            .entry(collection.0.clone())
            .or_default()
            .last_modified = Some(now);
    }

    fn insert(&self, collection: &CollectionId, mut value: Value) -> RecordId {
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = format!("id-{n}");
        value["id"] = Value::String(id.clone());
        self.records
            .borrow_mut()
            .entry(collection.0.clone())
            .or_default()
            .push(value);
        self.touch(collection);
        RecordId(id)
    }

    fn replace(&self, collection: &CollectionId, value: Value) -> Result<(), SyncError> {
        let mut records = self.records.borrow_mut();
        let slot = records
            .get_mut(&collection.0)
            .and_then(|rs| rs.iter_mut().find(|r| r["id"] == value["id"]))
            .ok_or_else(|| SyncError::Store {
                method: "PUT",
                path: format!("/collections/{collection}/records/{}", value["id"]),
                message: "404 record not found".into(),
            })?;
        *slot = value;
        drop(records);
        self.touch(collection);
        Ok(())
    }
}

impl RecordStore for MemoryStore {
    fn list_records<R: DeserializeOwned>(
        &self,
        collection: &CollectionId,
    ) -> Result<Vec<R>, SyncError> {
        let records = self.records.borrow();
        let Some(values) = records.get(&collection.0) else {
            return Ok(Vec::new());
        };
        let mut out = Vec::with_capacity(values.len());
        for value in values {
            out.push(serde_json::from_value(value.clone())?);
        }
        Ok(out)
    }

    fn create_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<RecordId, SyncError> {
        Ok(self.insert(collection, serde_json::to_value(record)?))
    }

    fn update_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<(), SyncError> {
        self.replace(collection, serde_json::to_value(record)?)
    }

    fn batch<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        operations: &[BatchOperation<R>],
    ) -> Result<BatchOutcome, SyncError> {
        if self.fail_batch.get() {
            return Err(SyncError::Store {
                method: "POST",
                path: "/batch".into(),
                message: "connection reset".into(),
            });
        }
        let mut outcome = BatchOutcome::default();
        for (index, op) in operations.iter().enumerate() {
            if self.cut_batch_after.get().is_some_and(|n| index >= n) {
                outcome.rejected.push(BatchRejection {
                    index,
                    status: 0,
                    message: "connection reset".into(),
                });
                continue;
            }
            let value = serde_json::to_value(op.record())?;
            let domain = value["Domain"].as_str().unwrap_or_default().to_string();
            if self.reject_domains.borrow().contains(&domain) {
                outcome.rejected.push(BatchRejection {
                    index,
                    status: 400,
                    message: "Invalid record".into(),
                });
                continue;
            }
            match op {
                BatchOperation::Create(_) => {
                    self.insert(collection, value);
                }
                BatchOperation::Update(_) => self.replace(collection, value)?,
            }
            outcome.applied += 1;
        }
        Ok(outcome)
    }

    fn collection_metadata(
        &self,
        collection: &CollectionId,
    ) -> Result<CollectionMetadata, SyncError> {
        Ok(self
            .metadata
            .borrow()
            .get(&collection.0)
            .cloned()
            .unwrap_or_default())
    }

    fn patch_metadata(
        &self,
        collection: &CollectionId,
        patch: &CollectionMetadata,
    ) -> Result<(), SyncError> {
        self.patches
            .borrow_mut()
            .push((collection.0.clone(), patch.clone()));
        let mut metadata = self.metadata.borrow_mut();
        let entry = metadata.entry(collection.0.clone()).or_default();
        if let Some(status) = &patch.status {
            entry.status = Some(status.clone());
        }
        Ok(())
    }
}
