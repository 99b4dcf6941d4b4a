//! Firestore REST document sink
//!
//! Writes each record as one document in a collection. Records are encoded
//! using Firestore's typed value format so they stay queryable from the
//! console.

use super::{RemoteSink, SinkConnector, SinkCredentials, SinkError, SinkHandle, SinkRecord};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Firestore REST base URL
pub const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com/v1";

/// Connects a [`FirestoreSink`] and verifies the collection is reachable
pub struct FirestoreConnector {
    request_timeout: Duration,
}

impl Default for FirestoreConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl FirestoreConnector {
    pub fn new() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Per-request timeout used by the resulting sink
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[async_trait]
impl SinkConnector for FirestoreConnector {
    async fn connect(&self, credentials: SinkCredentials) -> Result<SinkHandle, SinkError> {
        let client = Client::builder().timeout(self.request_timeout).build()?;
        let sink = FirestoreSink::new(client, &credentials);
        sink.handshake().await?;

        let handle: SinkHandle = Arc::new(sink);
        Ok(handle)
    }
}

/// Writes records to a Firestore collection
pub struct FirestoreSink {
    client: Client,
    documents_url: String,
    collection: String,
    access_token: Option<String>,
}

impl FirestoreSink {
    fn new(client: Client, credentials: &SinkCredentials) -> Self {
        Self {
            client,
            documents_url: documents_url(credentials),
            collection: credentials.collection.clone(),
            access_token: credentials.access_token().map(str::to_string),
        }
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.documents_url.trim_end_matches('/'),
            self.collection
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// List at most one document to prove credentials and endpoint work
    async fn handshake(&self) -> Result<(), SinkError> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .query(&[("pageSize", "1")])
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl RemoteSink for FirestoreSink {
    async fn write(&self, record: SinkRecord) -> Result<(), SinkError> {
        let document_id = Uuid::new_v4().to_string();
        let response = self
            .authorize(self.client.post(self.collection_url()))
            .query(&[("documentId", document_id.as_str())])
            .json(&to_document(&record))
            .send()
            .await?;
        check_status(response).await
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), SinkError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(SinkError::Rejected { status, body })
}

fn documents_url(credentials: &SinkCredentials) -> String {
    match &credentials.endpoint {
        Some(endpoint) => endpoint.clone(),
        None => format!(
            "{}/projects/{}/databases/(default)/documents",
            FIRESTORE_API_URL, credentials.project_id
        ),
    }
}

/// Encode a record as a Firestore document body
fn to_document(record: &SinkRecord) -> Value {
    json!({
        "fields": {
            "timestamp": { "timestampValue": record.timestamp.to_rfc3339() },
            "level": { "stringValue": record.level.as_str() },
            "source": { "stringValue": record.source },
            "message": { "stringValue": record.message },
            "metadata": { "mapValue": { "fields": encode_map(&record.metadata) } },
        }
    })
}

fn encode_map(map: &Map<String, Value>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), encode_value(v)))
            .collect(),
    )
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            // Firestore carries 64-bit integers as strings
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => json!({ "mapValue": { "fields": encode_map(map) } }),
    }
}
