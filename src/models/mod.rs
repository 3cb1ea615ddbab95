// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod document;
pub mod equipment;
pub mod loan;
pub mod task;
pub mod user;

pub use document::{Document, FieldValue, Fields, Record};
pub use equipment::Equipment;
pub use loan::{LoanRequest, LoanSummary};
pub use task::{Task, TaskSummary};
pub use user::{Role, User};
