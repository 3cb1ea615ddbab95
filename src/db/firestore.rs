// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed document store.
//!
//! Provides:
//! - One-shot reads and queries, converted to schemaless [`Document`]s
//! - Creates with generated IDs and keyed sets
//! - Live queries built on a Firestore listen target, re-querying the full
//!   result set after each change so subscribers always see whole snapshots

use crate::db::store::{Direction, DocumentStore, Query, SnapshotResult, Subscription};
use crate::error::StoreError;
use crate::models::{Document, FieldValue, Fields};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use firestore::select_filter_builder::FirestoreQueryFilterBuilder;
use firestore::{
    FirestoreListenEvent, FirestoreListenerTarget, FirestoreMemListenStateStorage,
    FirestoreQueryDirection, FirestoreQueryFilter,
};
use gcloud_sdk::google::firestore::v1::{value::ValueType, Document as RawDocument, Value};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};

// Each subscription owns its own listener, so a fixed target ID is enough.
const LISTEN_TARGET_ID: u32 = 1;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreStore {
    client: Option<firestore::FirestoreDb>,
}

/// Deserialization target used only to read back a generated document ID.
#[derive(Deserialize)]
struct CreatedDocument {
    #[serde(alias = "_firestore_id")]
    id: Option<String>,
}

impl FirestoreStore {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, StoreError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id).await.map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, StoreError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            StoreError::Unavailable(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client (offline mode).
    ///
    /// All operations return [`StoreError::Offline`].
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, StoreError> {
        self.client.as_ref().ok_or(StoreError::Offline)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let raw: Option<RawDocument> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collection)
            .one(id)
            .await
            .map_err(map_firestore_error)?;

        Ok(raw.as_ref().map(document_from_raw))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        run_query(self.get_client()?, query).await
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription, StoreError> {
        let client = self.get_client()?.clone();

        let mut listener = client
            .create_listener(FirestoreMemListenStateStorage::new())
            .await
            .map_err(map_firestore_error)?;

        client
            .fluent()
            .select()
            .from(query.collection.as_str())
            .filter(|q| query_filter(q, &query.filters))
            .listen()
            .add_target(FirestoreListenerTarget::new(LISTEN_TARGET_ID), &mut listener)
            .map_err(map_firestore_error)?;

        // Listen events only mark the result set dirty; a single refresher
        // re-runs the query, so a burst of changes coalesces into one read.
        let dirty = Arc::new(Notify::new());
        let listen_dirty = dirty.clone();
        listener
            .start(move |event| {
                let dirty = listen_dirty.clone();
                async move {
                    if !matches!(event, FirestoreListenEvent::TargetChange(_)) {
                        dirty.notify_one();
                    }
                    Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
                }
            })
            .await
            .map_err(map_firestore_error)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let refresher = tokio::spawn(refresh_loop(client, query.clone(), dirty, tx));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let collection = query.collection.clone();
        let task = tokio::spawn(async move {
            // Either an explicit release or a dropped Subscription.
            let _ = shutdown_rx.await;
            refresher.abort();
            if let Err(e) = listener.shutdown().await {
                tracing::warn!(error = %e, collection = %collection, "Listener shutdown failed");
            }
            tracing::debug!(collection = %collection, "Subscription released");
        });

        tracing::debug!(collection = %query.collection, "Subscription opened");
        Ok(Subscription::with_listener(rx, shutdown_tx, task))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        let created: CreatedDocument = self
            .get_client()?
            .fluent()
            .insert()
            .into(collection)
            .generate_document_id()
            .object(&fields)
            .execute()
            .await
            .map_err(map_firestore_error)?;

        created
            .id
            .ok_or_else(|| StoreError::Backend("Created document has no ID".to_string()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collection)
            .document_id(id)
            .object(&fields)
            .execute()
            .await
            .map_err(map_firestore_error)?;
        Ok(())
    }
}

/// Deliver the initial snapshot, then one snapshot per batch of changes,
/// until the subscriber goes away.
async fn refresh_loop(
    client: firestore::FirestoreDb,
    query: Query,
    dirty: Arc<Notify>,
    tx: mpsc::UnboundedSender<SnapshotResult>,
) {
    loop {
        let snapshot = run_query(&client, &query).await;
        if let Err(e) = &snapshot {
            tracing::error!(error = %e, collection = %query.collection, "Snapshot query failed");
        }
        if tx.send(snapshot).is_err() {
            return;
        }
        tokio::select! {
            _ = dirty.notified() => {}
            _ = tx.closed() => return,
        }
    }
}

async fn run_query(client: &firestore::FirestoreDb, query: &Query) -> SnapshotResult {
    let select = client
        .fluent()
        .select()
        .from(query.collection.as_str())
        .filter(|q| query_filter(q, &query.filters));

    let select = match &query.order_by {
        Some((field, direction)) => {
            let direction = match direction {
                Direction::Ascending => FirestoreQueryDirection::Ascending,
                Direction::Descending => FirestoreQueryDirection::Descending,
            };
            select.order_by([(field.as_str(), direction)])
        }
        None => select,
    };

    let raw: Vec<RawDocument> = select.query().await.map_err(map_firestore_error)?;
    Ok(raw.iter().map(document_from_raw).collect())
}

fn query_filter(
    q: FirestoreQueryFilterBuilder,
    filters: &[(String, FieldValue)],
) -> Option<FirestoreQueryFilter> {
    q.for_all(
        filters
            .iter()
            .map(|(field, value)| q.field(field.as_str()).eq(value.clone())),
    )
}

fn map_firestore_error(e: firestore::errors::FirestoreError) -> StoreError {
    use firestore::errors::FirestoreError;
    let message = e.to_string();
    match e {
        FirestoreError::DataNotFoundError(_) => StoreError::NotFound(message),
        FirestoreError::NetworkError(_) => StoreError::Unavailable(message),
        _ if message.contains("PermissionDenied") || message.contains("PERMISSION_DENIED") => {
            StoreError::PermissionDenied(message)
        }
        _ => StoreError::Backend(message),
    }
}

/// Convert a raw Firestore document into the schemaless model.
pub fn document_from_raw(raw: &RawDocument) -> Document {
    let id = raw.name.rsplit('/').next().unwrap_or_default();
    let fields = raw
        .fields
        .iter()
        .map(|(name, value)| (name.clone(), field_value_from_raw(value)))
        .collect();
    Document::new(id, fields)
}

fn field_value_from_raw(value: &Value) -> FieldValue {
    match &value.value_type {
        None | Some(ValueType::NullValue(_)) => FieldValue::Null,
        Some(ValueType::BooleanValue(b)) => FieldValue::Bool(*b),
        Some(ValueType::IntegerValue(i)) => FieldValue::Integer(*i),
        Some(ValueType::DoubleValue(d)) => FieldValue::Double(*d),
        Some(ValueType::TimestampValue(ts)) => {
            chrono::DateTime::from_timestamp(ts.seconds, ts.nanos.max(0) as u32)
                .map(FieldValue::Timestamp)
                .unwrap_or(FieldValue::Null)
        }
        Some(ValueType::StringValue(s)) => FieldValue::String(s.clone()),
        // Raw bytes are surfaced in the same text-safe form used for images.
        Some(ValueType::BytesValue(b)) => FieldValue::String(BASE64.encode(b)),
        Some(ValueType::ReferenceValue(r)) => FieldValue::String(r.clone()),
        Some(ValueType::GeoPointValue(p)) => FieldValue::Map(
            Fields::new()
                .with("latitude", p.latitude)
                .with("longitude", p.longitude),
        ),
        Some(ValueType::ArrayValue(a)) => {
            FieldValue::Array(a.values.iter().map(field_value_from_raw).collect())
        }
        Some(ValueType::MapValue(m)) => FieldValue::Map(
            m.fields
                .iter()
                .map(|(name, v)| (name.clone(), field_value_from_raw(v)))
                .collect(),
        ),
        // Pipeline and function expressions never appear in stored documents.
        Some(_) => FieldValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gcloud_sdk::google::firestore::v1::MapValue;
    use std::collections::HashMap;

    fn string_value(s: &str) -> Value {
        Value {
            value_type: Some(ValueType::StringValue(s.to_string())),
        }
    }

    #[test]
    fn test_document_from_raw() {
        let mut nested = HashMap::new();
        nested.insert("n".to_string(), Value {
            value_type: Some(ValueType::IntegerValue(7)),
        });

        let mut fields = HashMap::new();
        fields.insert("status".to_string(), string_value("pending"));
        fields.insert("requestDate".to_string(), Value {
            value_type: Some(ValueType::TimestampValue(gcloud_sdk::prost_types::Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            })),
        });
        fields.insert("meta".to_string(), Value {
            value_type: Some(ValueType::MapValue(MapValue { fields: nested })),
        });
        fields.insert("empty".to_string(), Value { value_type: None });

        let raw = RawDocument {
            name: "projects/p/databases/(default)/documents/loans/abc123".to_string(),
            fields,
            ..Default::default()
        };

        let doc = document_from_raw(&raw);
        assert_eq!(doc.id, "abc123");
        assert_eq!(doc.fields.get_str("status"), Some("pending"));
        assert_eq!(
            doc.fields.get_timestamp("requestDate").map(|t| t.timestamp()),
            Some(1_700_000_000)
        );
        assert_eq!(
            doc.fields.get("meta").and_then(FieldValue::as_map).and_then(|m| m.get_i64("n")),
            Some(7)
        );
        assert_eq!(doc.fields.get("empty"), Some(&FieldValue::Null));
    }

    #[test]
    fn test_fields_through_firestore_values() {
        let now = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let fields = Fields::new()
            .with("requesterId", "u1")
            .with("requestDate", now)
            .with("tags", FieldValue::Array(vec!["a".into()]));

        let value: firestore::FirestoreValue = fields.clone().into();
        match &value.value.value_type {
            Some(ValueType::MapValue(m)) => assert!(matches!(
                m.fields.get("requestDate").and_then(|v| v.value_type.as_ref()),
                Some(ValueType::TimestampValue(_))
            )),
            other => panic!("expected a map value, got {:?}", other),
        }

        let echoed = Fields::deserialize(value).unwrap();
        assert_eq!(echoed, fields);
    }

    #[test]
    fn test_filter_value_is_native_string() {
        let value: firestore::FirestoreValue = FieldValue::from("u1").into();
        assert_eq!(value.value, string_value("u1"));
    }

    #[tokio::test]
    async fn test_offline_mode_errors() {
        let store = FirestoreStore::new_mock();
        assert_eq!(
            store.get("users", "u1").await.unwrap_err(),
            StoreError::Offline
        );
        assert!(store.subscribe(&Query::collection("loans")).await.is_err());
    }
}
