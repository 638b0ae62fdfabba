//! Remote Settings (Kinto v1) record store over HTTP.
//!
//! ```text
//! GET   {server}/buckets/{bid}/collections/{cid}/records
//! POST  {server}/buckets/{bid}/collections/{cid}/records
//! PUT   {server}/buckets/{bid}/collections/{cid}/records/{id}
//! GET   {server}/buckets/{bid}/collections/{cid}
//! PATCH {server}/buckets/{bid}/collections/{cid}
//! POST  {server}/batch
//! ```
//!
//! Request and response bodies wrap the payload in `{"data": ...}`. Record
//! listings are paginated; each page links the next through the `Next-Page`
//! header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use credsync_core::{BucketId, CollectionId, CollectionMetadata, Config, RecordId};
use credsync_sync::{
    BatchOperation, BatchOutcome, BatchRejection, RecordStore, StoreRecord, SyncError,
};

const NEXT_PAGE_HEADER: &str = "Next-Page";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Serialize)]
struct DataBody<'a, T: Serialize> {
    data: &'a T,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    responses: Vec<SubResponse>,
}

#[derive(Debug, Deserialize)]
struct SubResponse {
    status: u16,
    #[serde(default)]
    body: Value,
}

pub struct RemoteSettingsClient {
    agent: ureq::Agent,
    server: String,
    bucket: BucketId,
    authorization: String,
    batch_limit: usize,
}

impl RemoteSettingsClient {
    pub fn new(agent: ureq::Agent, config: &Config) -> Self {
        Self {
            agent,
            server: config.server.clone(),
            bucket: config.bucket.clone(),
            authorization: format!(
                "Basic {}",
                STANDARD.encode(config.credentials.basic_pair())
            ),
            batch_limit: config.batch_limit.max(1),
        }
    }

    pub fn bucket(&self) -> &BucketId {
        &self.bucket
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server, path)
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, SyncError> {
        let response = self.call(method, &self.url(path), path, body)?;
        read_json(method, path, response)
    }

    /// Issue one request against an absolute `url`. `path` names the
    /// request in errors and logs.
    fn call(
        &self,
        method: &'static str,
        url: &str,
        path: &str,
        body: Option<Value>,
    ) -> Result<ureq::Response, SyncError> {
        let request = self
            .agent
            .request(method, url)
            .set("Authorization", &self.authorization);
        tracing::debug!(method, path, "remote settings request");
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        result.map_err(|err| SyncError::Store {
            method,
            path: path.to_string(),
            message: super::describe(err),
        })
    }
}

fn read_json<T: DeserializeOwned>(
    method: &'static str,
    path: &str,
    response: ureq::Response,
) -> Result<T, SyncError> {
    response.into_json().map_err(|err| SyncError::Store {
        method,
        path: path.to_string(),
        message: format!("invalid JSON body: {err}"),
    })
}

impl RecordStore for RemoteSettingsClient {
    fn list_records<R: DeserializeOwned>(
        &self,
        collection: &CollectionId,
    ) -> Result<Vec<R>, SyncError> {
        let path = records_path(&self.bucket, collection);
        let mut url = self.url(&path);
        let mut records = Vec::new();
        loop {
            let response = self.call("GET", &url, &path, None)?;
            let next_page = response.header(NEXT_PAGE_HEADER).map(str::to_string);
            let envelope: Envelope<Vec<R>> = read_json("GET", &path, response)?;
            records.extend(envelope.data);
            match next_page {
                Some(next) if next != url => url = next,
                _ => break,
            }
        }
        Ok(records)
    }

    fn create_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<RecordId, SyncError> {
        let body = serde_json::to_value(DataBody { data: record })?;
        let envelope: Envelope<Value> =
            self.send("POST", &records_path(&self.bucket, collection), Some(body))?;
        envelope.data["id"]
            .as_str()
            .map(RecordId::from)
            .ok_or_else(|| SyncError::Store {
                method: "POST",
                path: records_path(&self.bucket, collection),
                message: "created record has no id".to_string(),
            })
    }

    fn update_record<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        record: &R,
    ) -> Result<(), SyncError> {
        let path = update_path(&self.bucket, collection, record)?;
        let body = serde_json::to_value(DataBody { data: record })?;
        let _: Envelope<Value> = self.send("PUT", &path, Some(body))?;
        Ok(())
    }

    fn batch<R: StoreRecord>(
        &self,
        collection: &CollectionId,
        operations: &[BatchOperation<R>],
    ) -> Result<BatchOutcome, SyncError> {
        // Every chunk is shaped before the first request goes out.
        let bodies = operations
            .chunks(self.batch_limit)
            .map(|chunk| batch_body(&self.bucket, collection, chunk))
            .collect::<Result<Vec<_>, _>>()?;

        let mut outcome = BatchOutcome::default();
        let chunks = operations.chunks(self.batch_limit).zip(bodies);
        for (chunk_no, (chunk, body)) in chunks.enumerate() {
            let offset = chunk_no * self.batch_limit;
            let response: BatchResponse = match self.send("POST", "/batch", Some(body)) {
                Ok(response) => response,
                Err(err) if outcome.applied > 0 => {
                    tracing::warn!(
                        collection = %collection,
                        applied = outcome.applied,
                        unconfirmed = operations.len() - offset,
                        error = %err,
                        "batch chunk failed after earlier chunks were applied"
                    );
                    outcome
                        .rejected
                        .extend(unconfirmed(offset, operations.len(), &err.to_string()));
                    break;
                }
                Err(err) => return Err(err),
            };
            let rejected = rejections(offset, &response.responses);
            outcome.applied += chunk.len().saturating_sub(rejected.len());
            outcome.rejected.extend(rejected);
        }
        Ok(outcome)
    }

    fn collection_metadata(
        &self,
        collection: &CollectionId,
    ) -> Result<CollectionMetadata, SyncError> {
        let envelope: Envelope<CollectionMetadata> =
            self.send("GET", &collection_path(&self.bucket, collection), None)?;
        Ok(envelope.data)
    }

    fn patch_metadata(
        &self,
        collection: &CollectionId,
        patch: &CollectionMetadata,
    ) -> Result<(), SyncError> {
        let body = serde_json::to_value(DataBody { data: patch })?;
        let _: Envelope<Value> =
            self.send("PATCH", &collection_path(&self.bucket, collection), Some(body))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request shaping
// ---------------------------------------------------------------------------

fn collection_path(bucket: &BucketId, collection: &CollectionId) -> String {
    format!("/buckets/{bucket}/collections/{collection}")
}

fn records_path(bucket: &BucketId, collection: &CollectionId) -> String {
    format!("{}/records", collection_path(bucket, collection))
}

fn record_path(bucket: &BucketId, collection: &CollectionId, id: &RecordId) -> String {
    format!("{}/{id}", records_path(bucket, collection))
}

fn update_path<R: StoreRecord>(
    bucket: &BucketId,
    collection: &CollectionId,
    record: &R,
) -> Result<String, SyncError> {
    record
        .record_id()
        .map(|id| record_path(bucket, collection, id))
        .ok_or_else(|| SyncError::Store {
            method: "PUT",
            path: records_path(bucket, collection),
            message: "update requires a record id".to_string(),
        })
}

fn batch_body<R: StoreRecord>(
    bucket: &BucketId,
    collection: &CollectionId,
    operations: &[BatchOperation<R>],
) -> Result<Value, SyncError> {
    let mut requests = Vec::with_capacity(operations.len());
    for op in operations {
        let (method, path) = match op {
            BatchOperation::Create(_) => ("POST", records_path(bucket, collection)),
            BatchOperation::Update(record) => ("PUT", update_path(bucket, collection, record)?),
        };
        requests.push(json!({
            "method": method,
            "path": path,
            "body": { "data": serde_json::to_value(op.record())? },
        }));
    }
    Ok(json!({ "requests": requests }))
}

/// Operations `from..to` of a batch whose chunk got no answer. The server may
/// or may not have applied them.
fn unconfirmed(from: usize, to: usize, message: &str) -> Vec<BatchRejection> {
    (from..to)
        .map(|index| BatchRejection {
            index,
            status: 0,
            message: message.to_string(),
        })
        .collect()
}

// Kinto answers a batch with HTTP 200 even when sub-requests fail.
fn rejections(offset: usize, responses: &[SubResponse]) -> Vec<BatchRejection> {
    responses
        .iter()
        .enumerate()
        .filter(|(_, r)| r.status >= 400)
        .map(|(i, r)| BatchRejection {
            index: offset + i,
            status: r.status,
            message: r.body["message"]
                .as_str()
                .or_else(|| r.body["error"].as_str())
                .unwrap_or("unknown error")
                .to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use credsync_core::{Domain, PasswordRuleRecord};

    use super::*;

    fn bucket() -> BucketId {
        BucketId::from("main-workspace")
    }

    #[test]
    fn paths_follow_kinto_layout() {
        let c = CollectionId::password_rules();
        assert_eq!(
            records_path(&bucket(), &c),
            "/buckets/main-workspace/collections/password-rules/records"
        );
        assert_eq!(
            record_path(&bucket(), &c, &RecordId::from("r1")),
            "/buckets/main-workspace/collections/password-rules/records/r1"
        );
    }

    #[test]
    fn batch_body_maps_creates_and_updates() {
        let c = CollectionId::password_rules();
        let ops = vec![
            BatchOperation::Create(PasswordRuleRecord::new(Domain::from("y.com"), "r2")),
            BatchOperation::Update(
                PasswordRuleRecord::new(Domain::from("x.com"), "r1").with_id(RecordId::from("abc")),
            ),
        ];
        let body = batch_body(&bucket(), &c, &ops).expect("body");
        let requests = body["requests"].as_array().expect("requests");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0]["method"], "POST");
        assert_eq!(requests[0]["body"]["data"]["Domain"], "y.com");
        assert!(requests[0]["body"]["data"].get("id").is_none());
        assert_eq!(requests[1]["method"], "PUT");
        assert!(requests[1]["path"].as_str().expect("path").ends_with("/records/abc"));
        assert_eq!(requests[1]["body"]["data"]["password-rules"], "r1");
    }

    #[test]
    fn update_without_id_is_refused() {
        let c = CollectionId::password_rules();
        let ops = vec![BatchOperation::Update(PasswordRuleRecord::new(
            Domain::from("x.com"),
            "r1",
        ))];
        assert!(matches!(
            batch_body(&bucket(), &c, &ops),
            Err(SyncError::Store { method: "PUT", .. })
        ));
    }

    #[test]
    fn rejections_are_offset_by_chunk() {
        let responses: BatchResponse = serde_json::from_value(json!({
            "responses": [
                {"status": 201, "path": "/x", "body": {"data": {}}},
                {"status": 400, "path": "/y", "body": {"message": "data.Domain is required"}},
                {"status": 503, "path": "/z", "body": {"error": "Service Unavailable"}}
            ]
        }))
        .expect("parse");
        let rejected = rejections(25, &responses.responses);
        assert_eq!(rejected.len(), 2);
        assert_eq!(rejected[0].index, 26);
        assert_eq!(rejected[0].message, "data.Domain is required");
        assert_eq!(rejected[1].status, 503);
        assert_eq!(rejected[1].message, "Service Unavailable");
    }
}
