//! Cloud Firestore document store over the REST API.
//!
//! Each schedule is one Firestore document at
//! `projects/{project}/databases/(default)/documents/{collection}/{key}`.
//! Writes use `PATCH` without an update mask, which replaces the whole
//! document (creating it when missing). Firestore wraps every value in a
//! typed envelope (`{"stringValue": "A"}`, `{"mapValue": {"fields": ..}}`);
//! payloads are converted to and from that form here.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::poll::{spawn_polling, DEFAULT_POLL_INTERVAL};
use super::{DocumentStore, StoreError, Subscription};
use crate::document_key::DocumentKey;
use crate::models::Schedule;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_COLLECTION: &str = "schedules";

/// Response body of a document read.
#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Firestore-backed document store.
///
/// Live subscriptions are emulated by polling.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    collection: String,
    poll_interval: Duration,
}

impl FirestoreStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            api_key: None,
            collection: DEFAULT_COLLECTION.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Points the store at another endpoint, e.g. the local emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_poll_interval(mut self, every: Duration) -> Self {
        self.poll_interval = every;
        self
    }

    /// Builds the REST URL for a document.
    fn document_url(&self, key: &DocumentKey) -> String {
        let url = format!(
            "{}/v1/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.project_id),
            urlencoding::encode(&self.collection),
            urlencoding::encode(&key.to_string()),
        );
        match &self.api_key {
            Some(api_key) => format!("{}?key={}", url, urlencoding::encode(api_key)),
            None => url,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Schedule>, StoreError> {
        let response = self
            .client
            .get(self.document_url(key))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Status {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        let document: FirestoreDocument = response
            .json()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        let payload = Value::Object(decode_fields(&document.fields));
        serde_json::from_value(payload)
            .map(Some)
            .map_err(|e| StoreError::Decode(key.to_string(), e.to_string()))
    }

    async fn set(&self, key: &DocumentKey, schedule: &Schedule) -> Result<(), StoreError> {
        let payload = serde_json::to_value(schedule)
            .map_err(|e| StoreError::Decode(key.to_string(), e.to_string()))?;
        let fields = match &payload {
            Value::Object(map) => encode_fields(map),
            _ => Map::new(),
        };

        let response = self
            .client
            .patch(self.document_url(key))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }

    async fn subscribe(&self, key: &DocumentKey) -> Result<Subscription, StoreError> {
        Ok(spawn_polling(self.clone(), key.clone(), self.poll_interval))
    }
}

fn encode_fields(map: &Map<String, Value>) -> Map<String, Value> {
    map.iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect()
}

fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) if n.is_i64() || n.is_u64() => json!({ "integerValue": n.to_string() }),
        Value::Number(n) => json!({ "doubleValue": n }),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), decode_value(value)))
        .collect()
}

fn decode_value(value: &Value) -> Value {
    let Some(typed) = value.as_object() else {
        return Value::Null;
    };

    if let Some(v) = typed.get("stringValue").or_else(|| typed.get("booleanValue")) {
        return v.clone();
    }
    if let Some(v) = typed.get("integerValue") {
        // Firestore sends 64-bit integers as strings
        return match v.as_str().and_then(|s| s.parse::<i64>().ok()) {
            Some(n) => Value::from(n),
            None => v.clone(),
        };
    }
    if let Some(v) = typed
        .get("doubleValue")
        .or_else(|| typed.get("timestampValue"))
        .or_else(|| typed.get("referenceValue"))
    {
        return v.clone();
    }
    if let Some(map) = typed.get("mapValue") {
        let fields = map
            .get("fields")
            .and_then(Value::as_object)
            .map(decode_fields)
            .unwrap_or_default();
        return Value::Object(fields);
    }
    if let Some(array) = typed.get("arrayValue") {
        let values: Vec<Value> = array
            .get("values")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(decode_value).collect())
            .unwrap_or_default();
        return Value::Array(values);
    }
    Value::Null
}
