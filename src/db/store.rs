// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The document store seam.
//!
//! Components receive an `Arc<dyn DocumentStore>` at construction instead of
//! reaching for a global client. Every operation is a single attempt: no
//! retries, no timeouts.

use crate::error::StoreError;
use crate::models::{Document, FieldValue, Fields};
use async_trait::async_trait;
use std::cmp::Ordering;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One snapshot delivery: the full current result set, or a failure.
pub type SnapshotResult = Result<Vec<Document>, StoreError>;

/// Sort direction for [`Query::order_by()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A collection query: equality filters plus an optional ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, FieldValue)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    /// Query over a whole collection.
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add a `field == value` filter.
    pub fn where_eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    /// Whether a document satisfies every filter.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(name, value)| fields.get(name) == Some(value))
    }

    /// Sort documents per this query's ordering (stable).
    ///
    /// Documents missing the order field are excluded, as a Firestore
    /// `orderBy` does.
    pub fn apply_order(&self, docs: &mut Vec<Document>) {
        let Some((field, direction)) = &self.order_by else {
            return;
        };
        docs.retain(|d| d.fields.contains(field));
        docs.sort_by(|a, b| {
            let ord = compare_values(a.fields.get(field), b.fields.get(field));
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
    }
}

fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> Ordering {
    match (a, b) {
        (Some(FieldValue::Timestamp(x)), Some(FieldValue::Timestamp(y))) => x.cmp(y),
        (Some(FieldValue::String(x)), Some(FieldValue::String(y))) => x.cmp(y),
        (Some(FieldValue::Integer(x)), Some(FieldValue::Integer(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
        _ => Ordering::Equal,
    }
}

/// A live query registration.
///
/// Yields the initial snapshot followed by one snapshot per change. The
/// owner must call [`Subscription::release`] on teardown; dropping the value
/// also signals the backing listener to stop, without waiting for it.
pub struct Subscription {
    rx: mpsc::UnboundedReceiver<SnapshotResult>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Subscription fed by a channel with nothing else to tear down.
    pub fn from_channel(rx: mpsc::UnboundedReceiver<SnapshotResult>) -> Self {
        Self {
            rx,
            shutdown: None,
            task: None,
        }
    }

    /// Subscription backed by a listener task that stops when signalled.
    pub fn with_listener(
        rx: mpsc::UnboundedReceiver<SnapshotResult>,
        shutdown: oneshot::Sender<()>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            rx,
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// Next snapshot delivery, or `None` once the store side has closed.
    pub async fn next(&mut self) -> Option<SnapshotResult> {
        self.rx.recv().await
    }

    /// Stop the listener and wait for it to wind down.
    pub async fn release(mut self) {
        self.rx.close();
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Subscription listener ended abnormally");
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Remote document database operations used by the client.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// One-shot query.
    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Open a live query.
    async fn subscribe(&self, query: &Query) -> Result<Subscription, StoreError>;

    /// Create a document with a store-assigned identifier.
    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError>;

    /// Create or replace a document under a caller-chosen identifier.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError>;
}
