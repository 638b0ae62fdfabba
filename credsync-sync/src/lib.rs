//! # credsync-sync
//!
//! Reconciliation of Remote Settings collections against Apple's
//! credential-backend datasets.
//!
//! Call [`pipeline::run`] with a [`SourceFeed`] and a [`RecordStore`] to
//! execute both passes, or the per-pass functions in [`pipeline`] for one.

pub mod diff;
pub mod error;
pub mod pipeline;
pub mod realms;
pub mod rules;
pub mod source;
pub mod store;

pub use error::SyncError;
pub use pipeline::{PassKind, PassReport, PassScope, RunOptions, RunReport};
pub use realms::{RealmsAction, StoredRealms};
pub use source::SourceFeed;
pub use store::{BatchOperation, BatchOutcome, BatchRejection, DryRunStore, RecordStore, StoreRecord};
