//! Password-rules reconciliation.
//!
//! The collection holds one record per domain. A pass creates records for
//! new domains and updates records whose rule string changed. Records for
//! domains the source no longer lists are left alone.

use std::collections::HashMap;

use credsync_core::{CollectionId, Domain, PasswordRuleRecord, PasswordRules, RecordId};

use crate::store::BatchOperation;
use crate::SyncError;

/// Destination lookup: domain to `(id, rules)`.
pub type DomainIndex<'a> = HashMap<&'a Domain, (&'a RecordId, &'a str)>;

/// Index destination records by domain.
///
/// Fails on a duplicate domain or a record without an id.
pub fn index_by_domain<'a>(
    collection: &CollectionId,
    destination: &'a [PasswordRuleRecord],
) -> Result<DomainIndex<'a>, SyncError> {
    let mut index = HashMap::with_capacity(destination.len());
    for record in destination {
        let Some(id) = record.id.as_ref() else {
            return Err(SyncError::MissingRecordId {
                collection: collection.clone(),
                record: format!("record for domain '{}'", record.domain),
            });
        };
        if index
            .insert(&record.domain, (id, record.rules.as_str()))
            .is_some()
        {
            return Err(SyncError::DuplicateDomain {
                collection: collection.clone(),
                domain: record.domain.clone(),
            });
        }
    }
    Ok(index)
}

/// Build the minimal batch turning `destination` into a mirror of `source`.
///
/// Operations follow source order. Rule comparison is case-sensitive.
pub fn reconcile(
    collection: &CollectionId,
    source: &PasswordRules,
    destination: &[PasswordRuleRecord],
) -> Result<Vec<BatchOperation<PasswordRuleRecord>>, SyncError> {
    let index = index_by_domain(collection, destination)?;

    let mut operations = Vec::new();
    for (domain, rules) in source.iter() {
        match index.get(domain) {
            None => operations.push(BatchOperation::Create(PasswordRuleRecord::new(
                domain.clone(),
                rules,
            ))),
            Some((id, current)) if *current != rules => {
                operations.push(BatchOperation::Update(
                    PasswordRuleRecord::new(domain.clone(), rules).with_id((*id).clone()),
                ))
            }
            Some(_) => {}
        }
    }
    Ok(operations)
}

/// Count of `(creates, updates)` in a batch.
pub fn tally<R>(operations: &[BatchOperation<R>]) -> (usize, usize) {
    let creates = operations.iter().filter(|op| op.is_create()).count();
    (creates, operations.len() - creates)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, domain: &str, rules: &str) -> PasswordRuleRecord {
        PasswordRuleRecord::new(Domain::from(domain), rules).with_id(RecordId::from(id))
    }

    fn collection() -> CollectionId {
        CollectionId::password_rules()
    }

    #[test]
    fn creates_missing_domain_only() {
        let source: PasswordRules = [("x.com", "rule1"), ("y.com", "rule2")]
            .into_iter()
            .collect();
        let dest = vec![record("1", "x.com", "rule1")];
        let ops = reconcile(&collection(), &source, &dest).expect("reconcile");
        assert_eq!(
            ops,
            vec![BatchOperation::Create(PasswordRuleRecord::new(
                Domain::from("y.com"),
                "rule2"
            ))]
        );
    }

    #[test]
    fn changed_rules_update_with_existing_id() {
        let source: PasswordRules = [("x.com", "minlength: 10;")].into_iter().collect();
        let dest = vec![record("abc", "x.com", "minlength: 8;")];
        let ops = reconcile(&collection(), &source, &dest).expect("reconcile");
        assert_eq!(
            ops,
            vec![BatchOperation::Update(record("abc", "x.com", "minlength: 10;"))]
        );
    }

    #[test]
    fn rule_comparison_is_case_sensitive() {
        let source: PasswordRules = [("x.com", "Required: upper;")].into_iter().collect();
        let dest = vec![record("1", "x.com", "required: upper;")];
        let ops = reconcile(&collection(), &source, &dest).expect("reconcile");
        assert_eq!(ops.len(), 1);
        assert!(!ops[0].is_create());
    }

    #[test]
    fn destination_only_domains_are_untouched() {
        let source: PasswordRules = [("x.com", "r")].into_iter().collect();
        let dest = vec![record("1", "x.com", "r"), record("2", "gone.com", "r")];
        let ops = reconcile(&collection(), &source, &dest).expect("reconcile");
        assert!(ops.is_empty());
    }

    #[test]
    fn operations_follow_source_order() {
        let source: PasswordRules = [("c.com", "1"), ("a.com", "2"), ("b.com", "3")]
            .into_iter()
            .collect();
        let dest = vec![record("9", "a.com", "old")];
        let ops = reconcile(&collection(), &source, &dest).expect("reconcile");
        let domains: Vec<_> = ops.iter().map(|op| op.record().domain.0.as_str()).collect();
        assert_eq!(domains, vec!["c.com", "a.com", "b.com"]);
        assert_eq!(tally(&ops), (2, 1));
    }

    #[test]
    fn duplicate_destination_domain_is_an_error() {
        let source: PasswordRules = [("x.com", "r")].into_iter().collect();
        let dest = vec![record("1", "x.com", "r"), record("2", "x.com", "s")];
        let err = reconcile(&collection(), &source, &dest).unwrap_err();
        assert!(
            matches!(&err, SyncError::DuplicateDomain { domain, .. } if domain.0 == "x.com"),
            "got: {err}"
        );
    }

    #[test]
    fn destination_record_without_id_is_an_error() {
        let source = PasswordRules::new();
        let dest = vec![PasswordRuleRecord::new(Domain::from("x.com"), "r")];
        let err = reconcile(&collection(), &source, &dest).unwrap_err();
        assert!(matches!(err, SyncError::MissingRecordId { .. }), "got: {err}");
    }

    #[test]
    fn second_pass_over_applied_batch_is_empty() {
        let source: PasswordRules = [("x.com", "r1"), ("y.com", "r2")].into_iter().collect();
        let mut dest = vec![record("1", "x.com", "old")];
        let ops = reconcile(&collection(), &source, &dest).expect("first");
        assert_eq!(ops.len(), 2);

        for (n, op) in ops.into_iter().enumerate() {
            match op {
                BatchOperation::Create(r) => dest.push(r.with_id(RecordId(format!("new-{n}")))),
                BatchOperation::Update(r) => {
                    let slot = dest
                        .iter_mut()
                        .find(|d| d.domain == r.domain)
                        .expect("existing");
                    *slot = r;
                }
            }
        }

        let ops = reconcile(&collection(), &source, &dest).expect("second");
        assert!(ops.is_empty(), "got: {ops:?}");
    }
}
