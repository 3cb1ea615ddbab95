// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live owner-scoped lists.
//!
//! A [`LiveList`] opens exactly one subscription for the signed-in identity
//! and mirrors each snapshot into a [`ListState`]. The subscription is the
//! only source of truth: creating flows never insert into the list
//! themselves, they rely on the store echoing their write.

use crate::config::Collections;
use crate::db::{Direction, DocumentStore, Query, SnapshotResult};
use crate::models::{loan, task, Record};
use crate::services::AuthService;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// Message shown when no identity is available.
pub const NOT_AUTHENTICATED: &str = "not authenticated";

/// What a list screen should render.
#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    /// No snapshot delivered yet
    Loading,
    Empty,
    /// Records in store order
    Populated(Vec<Record>),
    Error(String),
}

impl ListState {
    /// Records currently shown (empty unless populated).
    pub fn records(&self) -> &[Record] {
        match self {
            ListState::Populated(records) => records,
            _ => &[],
        }
    }
}

/// How snapshots equal to the current list are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Structurally equal snapshots leave the state untouched
    #[default]
    SkipUnchanged,
    /// Every snapshot replaces the list
    AlwaysReplace,
}

/// Which collection a list mirrors and how it is scoped.
#[derive(Debug, Clone, PartialEq)]
pub struct ListSpec {
    pub collection: String,
    /// Field holding the owner reference
    pub owner_field: String,
    pub order_by: Option<(String, Direction)>,
}

impl ListSpec {
    /// The caller's loan requests, in store order.
    pub fn loans(collections: &Collections) -> Self {
        Self {
            collection: collections.loans.clone(),
            owner_field: loan::fields::REQUESTER_ID.to_string(),
            order_by: None,
        }
    }

    /// The caller's tasks, newest first.
    pub fn tasks(collections: &Collections) -> Self {
        Self {
            collection: collections.tasks.clone(),
            owner_field: task::fields::OWNER_ID.to_string(),
            order_by: Some((task::fields::TIMESTAMP.to_string(), Direction::Descending)),
        }
    }

    /// The subscription query for `uid`.
    pub fn query_for(&self, uid: &str) -> Query {
        let query = Query::collection(&self.collection).where_eq(&self.owner_field, uid);
        match &self.order_by {
            Some((field, direction)) => query.order_by(field, *direction),
            None => query,
        }
    }
}

/// Pure reducer from snapshot deliveries to list state.
///
/// After an error delivery the model is halted: later snapshots from the
/// same activation are ignored and the error stays visible.
#[derive(Debug, Clone)]
pub struct ListModel {
    state: ListState,
    policy: RefreshPolicy,
    revision: u64,
    halted: bool,
}

impl ListModel {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            state: ListState::Loading,
            policy,
            revision: 0,
            halted: false,
        }
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    /// Number of state replacements so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Enter the error state for a missing identity.
    pub fn not_authenticated(&mut self) {
        self.fail(NOT_AUTHENTICATED.to_string());
    }

    /// Apply one delivery. Returns true when the state was replaced.
    pub fn apply(&mut self, delivery: SnapshotResult) -> bool {
        if self.halted {
            tracing::debug!("Ignoring snapshot after subscription error");
            return false;
        }

        let docs = match delivery {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!(error = %e, "List subscription failed");
                self.fail(format!("Failed to load data: {}", e));
                return true;
            }
        };

        let next = if docs.is_empty() {
            ListState::Empty
        } else {
            ListState::Populated(docs.into_iter().map(|d| d.into_record()).collect())
        };

        if self.policy == RefreshPolicy::SkipUnchanged && next == self.state {
            return false;
        }

        tracing::debug!(count = next.records().len(), "List updated");
        self.replace(next);
        true
    }

    fn fail(&mut self, message: String) {
        self.halted = true;
        self.replace(ListState::Error(message));
    }

    fn replace(&mut self, state: ListState) {
        self.state = state;
        self.revision += 1;
    }
}

/// A list view model bound to a live subscription.
///
/// Call [`LiveList::close`] when the owning screen goes away; dropping the
/// value stops the driver without waiting for it.
pub struct LiveList {
    state_rx: watch::Receiver<ListState>,
    revision: Arc<AtomicU64>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveList {
    /// Open the list for the current identity.
    ///
    /// Without an identity no subscription is opened and the state is
    /// immediately [`ListState::Error`].
    pub async fn open(
        store: &dyn DocumentStore,
        auth: &dyn AuthService,
        spec: &ListSpec,
        policy: RefreshPolicy,
    ) -> Self {
        let mut model = ListModel::new(policy);

        let Some(identity) = auth.current_user() else {
            tracing::warn!(collection = %spec.collection, "List opened without identity");
            model.not_authenticated();
            return Self::settled(model);
        };

        let query = spec.query_for(&identity.uid);
        let mut subscription = match store.subscribe(&query).await {
            Ok(subscription) => subscription,
            Err(e) => {
                model.apply(Err(e));
                return Self::settled(model);
            }
        };

        let (state_tx, state_rx) = watch::channel(model.state().clone());
        let revision = Arc::new(AtomicU64::new(model.revision()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let driver_revision = revision.clone();
        let collection = spec.collection.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    delivery = subscription.next() => {
                        let Some(delivery) = delivery else { break };
                        if model.apply(delivery) {
                            driver_revision.store(model.revision(), Ordering::SeqCst);
                            state_tx.send_replace(model.state().clone());
                        }
                    }
                }
            }
            subscription.release().await;
            tracing::debug!(collection = %collection, "Live list closed");
        });

        tracing::info!(collection = %spec.collection, uid = %identity.uid, "Live list opened");
        Self {
            state_rx,
            revision,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// A list whose state is final and which holds no subscription.
    fn settled(model: ListModel) -> Self {
        let (_, state_rx) = watch::channel(model.state().clone());
        Self {
            state_rx,
            revision: Arc::new(AtomicU64::new(model.revision())),
            shutdown: None,
            task: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> ListState {
        self.state_rx.borrow().clone()
    }

    /// Number of state replacements so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// A receiver that is notified on every state replacement.
    pub fn watch(&self) -> watch::Receiver<ListState> {
        self.state_rx.clone()
    }

    /// Wait for the next state replacement.
    ///
    /// Returns `None` once the list can no longer change.
    pub async fn changed(&mut self) -> Option<ListState> {
        self.state_rx.changed().await.ok()?;
        Some(self.state_rx.borrow_and_update().clone())
    }

    /// Release the subscription and wait for the driver to stop.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Live list driver ended abnormally");
            }
        }
    }
}

impl Drop for LiveList {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::models::{Document, Fields};

    fn docs(ids: &[&str]) -> Vec<Document> {
        ids.iter()
            .map(|id| Document::new(*id, Fields::new().with("ownerId", "u1")))
            .collect()
    }

    #[test]
    fn test_snapshot_maps_ids_in_order() {
        let mut model = ListModel::new(RefreshPolicy::SkipUnchanged);
        assert_eq!(model.state(), &ListState::Loading);

        assert!(model.apply(Ok(docs(&["b", "a", "c"]))));
        let ids: Vec<_> = model.state().records().iter().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_skip_unchanged_is_idempotent() {
        let mut model = ListModel::new(RefreshPolicy::SkipUnchanged);
        assert!(model.apply(Ok(docs(&["a", "b"]))));
        let before = model.revision();

        assert!(!model.apply(Ok(docs(&["a", "b"]))));
        assert_eq!(model.revision(), before);

        assert!(model.apply(Ok(Vec::new())));
        assert_eq!(model.state(), &ListState::Empty);
        assert!(!model.apply(Ok(Vec::new())));
    }

    #[test]
    fn test_always_replace_converges() {
        let mut model = ListModel::new(RefreshPolicy::AlwaysReplace);
        assert!(model.apply(Ok(docs(&["a"]))));
        let first = model.state().clone();

        assert!(model.apply(Ok(docs(&["a"]))));
        assert_eq!(model.revision(), 2);
        assert_eq!(model.state(), &first);
    }

    #[test]
    fn test_error_halts_updates() {
        let mut model = ListModel::new(RefreshPolicy::SkipUnchanged);
        assert!(model.apply(Ok(docs(&["a"]))));
        assert!(model.apply(Err(StoreError::PermissionDenied("rules".to_string()))));
        assert!(matches!(model.state(), ListState::Error(m) if m.contains("rules")));

        assert!(!model.apply(Ok(docs(&["a", "b"]))));
        assert!(matches!(model.state(), ListState::Error(_)));
    }

    #[test]
    fn test_not_authenticated() {
        let mut model = ListModel::new(RefreshPolicy::default());
        model.not_authenticated();
        assert_eq!(model.state(), &ListState::Error(NOT_AUTHENTICATED.to_string()));
    }

    #[test]
    fn test_list_spec_queries() {
        let collections = Collections::default();

        let loans = ListSpec::loans(&collections).query_for("u1");
        assert_eq!(loans.collection, "loans");
        assert_eq!(loans.filters, vec![("requesterId".to_string(), "u1".into())]);
        assert!(loans.order_by.is_none());

        let tasks = ListSpec::tasks(&collections).query_for("u1");
        assert_eq!(
            tasks.order_by,
            Some(("timestamp".to_string(), Direction::Descending))
        );
    }
}
