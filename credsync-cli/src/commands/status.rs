//! `credsync status` — review status of the managed collections.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use tabled::{settings::Style, Table, Tabled};

use credsync_core::{CollectionId, CollectionMetadata, CollectionStatus};
use credsync_sync::RecordStore;

/// Arguments for `credsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let session = super::connect()?;

        let mut rows = Vec::new();
        for collection in [CollectionId::related_realms(), CollectionId::password_rules()] {
            let metadata = session
                .store
                .collection_metadata(&collection)
                .with_context(|| format!("failed to read metadata for '{collection}'"))?;
            let records = session
                .store
                .list_records::<Value>(&collection)
                .with_context(|| format!("failed to list records of '{collection}'"))?;
            rows.push(CollectionStatusJson::new(&collection, &metadata, records.len()));
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&rows)?);
            return Ok(());
        }

        println!("bucket: {}", session.store.bucket());
        let table_rows: Vec<StatusTableRow> = rows.into_iter().map(StatusTableRow::from).collect();
        let mut table = Table::new(table_rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct CollectionStatusJson {
    collection: String,
    status: Option<String>,
    last_modified: Option<String>,
    records: usize,
}

impl CollectionStatusJson {
    fn new(collection: &CollectionId, metadata: &CollectionMetadata, records: usize) -> Self {
        Self {
            collection: collection.to_string(),
            status: metadata.status.as_ref().map(ToString::to_string),
            last_modified: metadata.last_modified.and_then(format_millis),
            records,
        }
    }
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "collection")]
    collection: String,
    #[tabled(rename = "status")]
    status: String,
    #[tabled(rename = "last modified")]
    last_modified: String,
    #[tabled(rename = "records")]
    records: usize,
}

impl From<CollectionStatusJson> for StatusTableRow {
    fn from(row: CollectionStatusJson) -> Self {
        Self {
            collection: row.collection,
            status: colorize_status(row.status.as_deref()),
            last_modified: row.last_modified.unwrap_or_else(|| "-".to_string()),
            records: row.records,
        }
    }
}

fn colorize_status(status: Option<&str>) -> String {
    let Some(status) = status else {
        return "-".dimmed().to_string();
    };
    let to_review = CollectionStatus::ToReview.to_string();
    let signed = CollectionStatus::Signed.to_string();
    if status == to_review {
        status.yellow().to_string()
    } else if status == signed {
        status.green().to_string()
    } else {
        status.to_string()
    }
}

fn format_millis(millis: u64) -> Option<String> {
    let millis = i64::try_from(millis).ok()?;
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}
