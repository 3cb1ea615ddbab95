// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Screen-level view models.

pub mod live_list;
pub mod selection;
pub mod session;
pub mod submission;

pub use live_list::{ListModel, ListSpec, ListState, LiveList, RefreshPolicy};
pub use selection::{LoadResult, LoadTicket, SelectionFlow, SelectionState};
pub use session::SessionFlow;
pub use submission::{LoanDraft, Outcome, RegistrationForm, Submitter, TaskDraft};
