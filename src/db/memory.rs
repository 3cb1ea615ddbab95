// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process document store.
//!
//! Behaves like the remote store for a single client: documents keep
//! insertion order, live queries receive a full snapshot after every write
//! that touches their collection. Every call is recorded, and failures can
//! be injected per operation and collection, so flows can be tested without
//! the emulator.

use crate::db::store::{DocumentStore, Query, SnapshotResult, Subscription};
use crate::error::StoreError;
use crate::models::{Document, Fields};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Store operation kinds, for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Get,
    Query,
    Subscribe,
    Add,
    Set,
}

/// A recorded store call.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub collection: String,
    /// Document ID for `get`/`set`, assigned ID for a successful `add`
    pub id: Option<String>,
    /// Written fields for `add`/`set`
    pub fields: Option<Fields>,
}

struct Watcher {
    query: Query,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct Inner {
    collections: DashMap<String, Vec<Document>>,
    watchers: Mutex<Vec<Watcher>>,
    calls: Mutex<Vec<StoreCall>>,
    failures: Mutex<HashMap<(StoreOp, String), StoreError>>,
    next_id: AtomicU64,
}

/// In-memory [`DocumentStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document without recording a call or notifying watchers.
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        upsert(
            &mut self.inner.collections.entry(collection.to_string()).or_default(),
            Document::new(id, fields),
        );
    }

    /// Make every subsequent `op` on `collection` fail with `err`.
    pub fn fail(&self, op: StoreOp, collection: &str, err: StoreError) {
        lock(&self.inner.failures).insert((op, collection.to_string()), err);
    }

    /// Remove an injected failure.
    pub fn heal(&self, op: StoreOp, collection: &str) {
        lock(&self.inner.failures).remove(&(op, collection.to_string()));
    }

    /// Deliver an error to every live query on `collection`.
    pub fn emit_error(&self, collection: &str, err: StoreError) {
        let mut watchers = lock(&self.inner.watchers);
        watchers.retain(|w| !w.tx.is_closed());
        for w in watchers.iter().filter(|w| w.query.collection == collection) {
            let _ = w.tx.send(Err(err.clone()));
        }
    }

    /// Re-deliver the current snapshot to every live query on `collection`.
    pub fn touch(&self, collection: &str) {
        self.notify(collection);
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.inner.calls).clone()
    }

    /// Recorded `add` and `set` calls.
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c.op, StoreOp::Add | StoreOp::Set))
            .collect()
    }

    /// Number of live queries whose receiver is still held.
    pub fn active_subscriptions(&self) -> usize {
        lock(&self.inner.watchers)
            .iter()
            .filter(|w| !w.tx.is_closed())
            .count()
    }

    /// Current contents of a collection.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.inner
            .collections
            .get(collection)
            .map(|docs| docs.value().clone())
            .unwrap_or_default()
    }

    fn record(&self, op: StoreOp, collection: &str, id: Option<&str>, fields: Option<&Fields>) {
        lock(&self.inner.calls).push(StoreCall {
            op,
            collection: collection.to_string(),
            id: id.map(str::to_string),
            fields: fields.cloned(),
        });
    }

    fn check(&self, op: StoreOp, collection: &str) -> Result<(), StoreError> {
        match lock(&self.inner.failures).get(&(op, collection.to_string())) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn snapshot(&self, query: &Query) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents(&query.collection)
            .into_iter()
            .filter(|d| query.matches(&d.fields))
            .collect();
        query.apply_order(&mut docs);
        docs
    }

    fn notify(&self, collection: &str) {
        let mut watchers = lock(&self.inner.watchers);
        watchers.retain(|w| !w.tx.is_closed());
        for w in watchers.iter().filter(|w| w.query.collection == collection) {
            let _ = w.tx.send(Ok(self.snapshot(&w.query)));
        }
    }
}

fn upsert(docs: &mut Vec<Document>, doc: Document) {
    match docs.iter_mut().find(|d| d.id == doc.id) {
        Some(existing) => *existing = doc,
        None => docs.push(doc),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.record(StoreOp::Get, collection, Some(id), None);
        self.check(StoreOp::Get, collection)?;
        Ok(self
            .inner
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn query(&self, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.record(StoreOp::Query, &query.collection, None, None);
        self.check(StoreOp::Query, &query.collection)?;
        Ok(self.snapshot(query))
    }

    async fn subscribe(&self, query: &Query) -> Result<Subscription, StoreError> {
        self.record(StoreOp::Subscribe, &query.collection, None, None);
        self.check(StoreOp::Subscribe, &query.collection)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watchers = lock(&self.inner.watchers);
        let _ = tx.send(Ok(self.snapshot(query)));
        watchers.push(Watcher {
            query: query.clone(),
            tx,
        });
        Ok(Subscription::from_channel(rx))
    }

    async fn add(&self, collection: &str, fields: Fields) -> Result<String, StoreError> {
        if let Err(e) = self.check(StoreOp::Add, collection) {
            self.record(StoreOp::Add, collection, None, Some(&fields));
            return Err(e);
        }

        let n = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("doc{:04}", n);
        self.record(StoreOp::Add, collection, Some(&id), Some(&fields));
        upsert(
            &mut self.inner.collections.entry(collection.to_string()).or_default(),
            Document::new(id.clone(), fields),
        );
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), StoreError> {
        self.record(StoreOp::Set, collection, Some(id), Some(&fields));
        self.check(StoreOp::Set, collection)?;

        upsert(
            &mut self.inner.collections.entry(collection.to_string()).or_default(),
            Document::new(id, fields),
        );
        self.notify(collection);
        Ok(())
    }
}
