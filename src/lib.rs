// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Loan-Desk: client core for equipment loan requests and tasks
//!
//! This crate keeps local view state in step with a remote document store:
//! live owner-scoped lists, validated single-shot submissions, and the
//! equipment chooser that leads to a loan request. The store and the auth
//! service are injected, so the same flows run against Firestore or the
//! in-memory implementations used in tests.

#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod db;
pub mod error;
pub mod flows;
pub mod models;
pub mod navigation;
pub mod services;

use config::Config;
use db::DocumentStore;
use services::{AuthService, ResourcePicker};
use std::sync::Arc;

/// Shared client state handed to every flow.
pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub auth: Arc<dyn AuthService>,
    pub picker: Arc<dyn ResourcePicker>,
}
