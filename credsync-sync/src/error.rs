//! Error types for credsync-sync.

use thiserror::Error;

use credsync_core::{CollectionId, ConfigError, Domain};

/// All errors that can arise from a reconciliation pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching the source dataset failed.
    #[error("source fetch failed for {url}: {message}")]
    Source { url: String, message: String },

    /// A request against the destination store failed.
    #[error("store request {method} {path} failed: {message}")]
    Store {
        method: &'static str,
        path: String,
        message: String,
    },

    /// The related-realms collection holds more than one record.
    #[error("collection {collection} holds {count} related-realms records; expected at most one")]
    DuplicateRealmsRecord {
        collection: CollectionId,
        count: usize,
    },

    /// Two destination records share one domain.
    #[error("collection {collection} holds more than one record for domain '{domain}'")]
    DuplicateDomain {
        collection: CollectionId,
        domain: Domain,
    },

    /// A destination record came back from the store without an id, so it
    /// could never be updated in place.
    #[error("collection {collection} returned a {record} without an id")]
    MissingRecordId {
        collection: CollectionId,
        record: String,
    },

    /// The store applied only part of a batch.
    #[error(
        "batch write to {collection} applied {applied} operation(s) and rejected {failed}; first rejection: {first}"
    )]
    PartialBatch {
        collection: CollectionId,
        applied: usize,
        failed: usize,
        first: String,
    },

    /// Local configuration or legacy data could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A payload did not have the expected JSON shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
