// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment chooser leading to a loan request.
//!
//! Every trigger (start, a selection, "choose another", an identity change)
//! begins a new load and bumps the generation. A load result carries the
//! generation it was started under and is dropped if a newer load has begun
//! since, so a slow response can never overwrite a newer one.

use crate::db::Query;
use crate::error::{AppError, StoreError};
use crate::flows::submission::{LoanDraft, Outcome, Submitter};
use crate::models::{Equipment, User};
use crate::navigation::{Destination, Navigation};
use crate::services::Identity;
use crate::AppContext;
use std::sync::Arc;

/// Screen state of the chooser.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    Loading,
    SignedOut {
        message: String,
    },
    /// No equipment chosen yet
    ChoosingEquipment {
        options: Vec<Equipment>,
        message: Option<String>,
    },
    EquipmentLoadFailed {
        message: String,
    },
    ReadyToSubmit {
        equipment: Equipment,
        /// Caller's profile, when it could be read
        requester: Option<User>,
    },
}

/// What a load was started for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub identity: Option<Identity>,
    pub equipment_id: Option<String>,
}

/// Outcome of the fetches behind one load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    SignedOut,
    Options {
        requester: Option<User>,
        options: Result<Vec<Equipment>, StoreError>,
    },
    Selected {
        requester: Option<User>,
        equipment: Result<Option<Equipment>, StoreError>,
    },
}

pub struct SelectionFlow {
    ctx: Arc<AppContext>,
    state: SelectionState,
    generation: u64,
    selected: Option<String>,
    draft: LoanDraft,
    submitter: Submitter,
}

impl SelectionFlow {
    /// A chooser for `equipment_id`; `""` means nothing is chosen yet.
    pub fn new(ctx: Arc<AppContext>, equipment_id: &str) -> Self {
        let selected = Some(equipment_id.trim())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Self {
            submitter: Submitter::new(ctx.clone()),
            ctx,
            state: SelectionState::Loading,
            generation: 0,
            selected,
            draft: LoanDraft::default(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Generation of the most recent load.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Submission message, if any.
    pub fn message(&self) -> Option<String> {
        self.submitter.message()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitter.is_submitting()
    }

    /// Enter `Loading` for the current inputs.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = SelectionState::Loading;
        LoadTicket {
            generation: self.generation,
            identity: self.ctx.auth.current_user(),
            equipment_id: self.selected.clone(),
        }
    }

    /// Run the fetches for `ticket`.
    ///
    /// Does not touch the flow, so several loads may be outstanding at once.
    pub async fn fetch(ctx: &AppContext, ticket: &LoadTicket) -> LoadResult {
        let Some(identity) = &ticket.identity else {
            return LoadResult::SignedOut;
        };
        let collections = &ctx.config.collections;

        let requester = match ctx.store.get(&collections.users, &identity.uid).await {
            Ok(doc) => doc.as_ref().map(User::from_document),
            Err(e) => {
                tracing::warn!(error = %e, uid = %identity.uid, "Could not read requester profile");
                None
            }
        };

        match &ticket.equipment_id {
            Some(id) => {
                let equipment = ctx
                    .store
                    .get(&collections.equipment, id)
                    .await
                    .map(|doc| doc.as_ref().map(Equipment::from_document));
                LoadResult::Selected {
                    requester,
                    equipment,
                }
            }
            None => {
                let options = ctx
                    .store
                    .query(&Query::collection(&collections.equipment))
                    .await
                    .map(|docs| docs.iter().map(Equipment::from_document).collect());
                LoadResult::Options { requester, options }
            }
        }
    }

    /// Apply a finished load. Returns false if the ticket is stale.
    pub fn apply(&mut self, ticket: &LoadTicket, result: LoadResult) -> bool {
        if ticket.generation != self.generation {
            tracing::warn!(
                stale = ticket.generation,
                current = self.generation,
                "Dropping superseded equipment load"
            );
            return false;
        }

        self.state = match result {
            LoadResult::SignedOut => SelectionState::SignedOut {
                message: AppError::NotAuthenticated.to_string(),
            },
            LoadResult::Options {
                options: Ok(options),
                ..
            } => SelectionState::ChoosingEquipment {
                options,
                message: None,
            },
            LoadResult::Options { options: Err(e), .. } => {
                tracing::warn!(error = %e, "Equipment list failed to load");
                SelectionState::ChoosingEquipment {
                    options: Vec::new(),
                    message: Some(format!("Error loading equipment: {}", e)),
                }
            }
            LoadResult::Selected {
                requester,
                equipment: Ok(Some(equipment)),
            } => SelectionState::ReadyToSubmit {
                equipment,
                requester,
            },
            LoadResult::Selected {
                equipment: Ok(None),
                ..
            } => SelectionState::EquipmentLoadFailed {
                message: "Equipment not found".to_string(),
            },
            LoadResult::Selected {
                equipment: Err(e), ..
            } => {
                tracing::warn!(error = %e, "Equipment failed to load");
                SelectionState::EquipmentLoadFailed {
                    message: format!("Error loading equipment: {}", e),
                }
            }
        };
        true
    }

    /// Fetch and apply `ticket`.
    pub async fn complete(&mut self, ticket: LoadTicket) -> bool {
        let result = Self::fetch(&self.ctx, &ticket).await;
        self.apply(&ticket, result)
    }

    /// Load for the current inputs.
    pub async fn start(&mut self) {
        let ticket = self.begin_load();
        self.complete(ticket).await;
    }

    /// Choose a piece of equipment from the list.
    pub async fn select(&mut self, equipment_id: &str) {
        self.selected = Some(equipment_id.to_string());
        self.start().await;
    }

    /// Drop the current choice and go back to the equipment list.
    pub async fn choose_another(&mut self) {
        self.selected = None;
        self.start().await;
    }

    /// Reload after the signed-in identity changed.
    pub async fn identity_changed(&mut self) {
        self.start().await;
    }

    pub fn set_return_date(&mut self, return_date: &str) {
        self.draft.return_date = return_date.to_string();
    }

    /// Submit a loan request for the chosen equipment.
    pub async fn submit(&mut self) -> Outcome {
        let SelectionState::ReadyToSubmit {
            equipment,
            requester,
        } = &self.state
        else {
            let message = "Choose equipment first".to_string();
            self.submitter.set_message(message.clone());
            return Outcome::Invalid(message);
        };

        self.submitter
            .submit_loan(equipment, requester.as_ref(), &mut self.draft)
            .await
    }

    /// Leave the flow for the loan list.
    pub fn leave(&self) -> Navigation {
        Navigation::to(Destination::LoanList)
    }
}
