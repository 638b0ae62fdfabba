//! credsync core library — domain types, configuration, errors.
//!
//! - [`types`] — newtypes, source datasets and destination records
//! - [`config`] — [`Config`] built once from the environment
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, Credentials};
pub use error::ConfigError;
pub use types::{
    BucketId, CollectionId, CollectionMetadata, CollectionStatus, Domain, PasswordRuleRecord,
    PasswordRules, RealmGroup, RecordId, RelatedRealmsRecord,
};
