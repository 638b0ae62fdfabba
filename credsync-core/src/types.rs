//! Domain types for the credential-backend datasets and their Remote Settings
//! records.
//!
//! Source types mirror Apple's `password-manager-resources` JSON files.
//! Record types mirror the Remote Settings collections they are written to.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Storage identity of a record, assigned by the destination store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Business key of a password rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Domain(pub String);

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Domain {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Remote Settings bucket name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BucketId(pub String);

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for BucketId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Remote Settings collection name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub String);

impl CollectionId {
    /// Collection holding the single related-realms record.
    pub fn related_realms() -> Self {
        Self::from(RELATED_REALMS_COLLECTION)
    }

    /// Collection holding one record per password-rule domain.
    pub fn password_rules() -> Self {
        Self::from(PASSWORD_RULES_COLLECTION)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

pub const RELATED_REALMS_COLLECTION: &str = "websites-with-shared-credential-backends";
pub const PASSWORD_RULES_COLLECTION: &str = "password-rules";

// ---------------------------------------------------------------------------
// Related realms
// ---------------------------------------------------------------------------

/// Realm identifiers that share one credential backend. Order is meaningful.
pub type RealmGroup = Vec<String>;

/// The single record of the related-realms collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedRealmsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "relatedRealms")]
    pub related_realms: Vec<RealmGroup>,
}

impl RelatedRealmsRecord {
    /// Payload for a record that does not exist in the store yet.
    pub fn new(related_realms: Vec<RealmGroup>) -> Self {
        Self {
            id: None,
            related_realms,
        }
    }
}

// ---------------------------------------------------------------------------
// Password rules
// ---------------------------------------------------------------------------

/// Destination record of the password-rules collection.
///
/// Field names on the wire follow the collection schema (`Domain`,
/// `password-rules`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRuleRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "Domain")]
    pub domain: Domain,
    #[serde(rename = "password-rules")]
    pub rules: String,
}

impl PasswordRuleRecord {
    pub fn new(domain: Domain, rules: impl Into<String>) -> Self {
        Self {
            id: None,
            domain,
            rules: rules.into(),
        }
    }

    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Source mapping from domain to rule string, in the order the source
/// listed them.
///
/// Deserializes from Apple's `password-rules.json` shape:
/// `{"example.com": {"password-rules": "minlength: 8;"}}`. A domain listed
/// twice keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasswordRules {
    entries: IndexMap<Domain, String>,
}

impl PasswordRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the rules for `domain`. Replacing keeps the
    /// original position.
    pub fn insert(&mut self, domain: Domain, rules: impl Into<String>) {
        self.entries.insert(domain, rules.into());
    }

    pub fn get(&self, domain: &Domain) -> Option<&str> {
        self.entries.get(domain).map(String::as_str)
    }

    pub fn contains(&self, domain: &Domain) -> bool {
        self.entries.contains_key(domain)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Domain, &str)> {
        self.entries.iter().map(|(domain, rules)| (domain, rules.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append every domain from `fallback` that `self` does not define.
    pub fn merge_missing_from(&mut self, fallback: PasswordRules) {
        for (domain, rules) in fallback.entries {
            self.entries.entry(domain).or_insert(rules);
        }
    }
}

impl<D: Into<Domain>, R: Into<String>> FromIterator<(D, R)> for PasswordRules {
    fn from_iter<I: IntoIterator<Item = (D, R)>>(iter: I) -> Self {
        let mut rules = PasswordRules::new();
        for (domain, rule) in iter {
            rules.insert(domain.into(), rule);
        }
        rules
    }
}

#[derive(Deserialize)]
struct SourceRuleEntry {
    #[serde(rename = "password-rules")]
    rules: String,
}

impl<'de> Deserialize<'de> for PasswordRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RulesVisitor;

        impl<'de> Visitor<'de> for RulesVisitor {
            type Value = PasswordRules;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of domain to {\"password-rules\": string}")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut rules = PasswordRules::new();
                while let Some((domain, entry)) = map.next_entry::<String, SourceRuleEntry>()? {
                    rules.insert(Domain(domain), entry.rules);
                }
                Ok(rules)
            }
        }

        deserializer.deserialize_map(RulesVisitor)
    }
}

// ---------------------------------------------------------------------------
// Collection metadata
// ---------------------------------------------------------------------------

/// Review-workflow status of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectionStatus {
    Signed,
    WorkInProgress,
    ToReview,
    ToSign,
    ToRollback,
    ToRefresh,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionStatus::Signed => write!(f, "signed"),
            CollectionStatus::WorkInProgress => write!(f, "work-in-progress"),
            CollectionStatus::ToReview => write!(f, "to-review"),
            CollectionStatus::ToSign => write!(f, "to-sign"),
            CollectionStatus::ToRollback => write!(f, "to-rollback"),
            CollectionStatus::ToRefresh => write!(f, "to-refresh"),
            CollectionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// The subset of collection metadata this tool reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CollectionStatus>,
    /// Epoch milliseconds of the last change, as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<u64>,
}

impl CollectionMetadata {
    /// Patch flagging the collection for human review.
    pub fn review_patch(last_modified: Option<u64>) -> Self {
        Self {
            status: Some(CollectionStatus::ToReview),
            last_modified,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
