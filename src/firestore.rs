use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::auth::{CLOUD_PLATFORM_SCOPE, ServiceAccount, TokenProvider};
use crate::store::{DocumentStore, PendingWrite};

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct CommitRequest {
    writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
struct Write {
    update: Document,
}

#[derive(Debug, Serialize)]
struct Document {
    name: String,
    fields: Map<String, Value>,
}

/// Firestore REST client committing batched document writes.
pub struct FirestoreClient {
    http: Client,
    auth: TokenProvider,
    project_id: String,
}

impl FirestoreClient {
    pub fn new(account: ServiceAccount, project_id: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build firestore http client")?;
        let auth = TokenProvider::new(http.clone(), account, CLOUD_PLATFORM_SCOPE);

        Ok(Self {
            http,
            auth,
            project_id,
        })
    }

    fn database_path(&self) -> String {
        database_path(&self.project_id)
    }
}

impl DocumentStore for FirestoreClient {
    fn commit(&mut self, collection: &str, writes: &[PendingWrite]) -> Result<()> {
        let body = commit_request(&self.database_path(), collection, writes);
        let url = format!("{FIRESTORE_API}/{}/documents:commit", self.database_path());
        let token = self.auth.bearer()?;

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .with_context(|| format!("failed to send commit for collection {collection}"))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            bail!("firestore commit for {collection} failed with {status}: {detail}");
        }

        debug!(collection = %collection, writes = writes.len(), "firestore commit accepted");
        Ok(())
    }
}

fn database_path(project_id: &str) -> String {
    format!("projects/{project_id}/databases/(default)")
}

fn commit_request(database: &str, collection: &str, writes: &[PendingWrite]) -> CommitRequest {
    CommitRequest {
        writes: writes
            .iter()
            .map(|write| Write {
                update: Document {
                    name: format!("{database}/documents/{collection}/{}", write.document_id),
                    fields: encode_fields(&write.fields),
                },
            })
            .collect(),
    }
}

/// Translates a JSON object into Firestore's typed `fields` map.
pub fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(flag) => json!({ "booleanValue": flag }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number.as_f64().unwrap_or_default() }),
        },
        Value::String(text) => json!({ "stringValue": text }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(entries) => json!({ "mapValue": { "fields": encode_fields(entries) } }),
    }
}
