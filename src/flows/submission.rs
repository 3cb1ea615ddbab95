// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Validated single-shot submissions.
//!
//! Each submission validates its draft, claims the `submitting` flag, makes
//! exactly one create call and reports the result as a user-visible message.
//! There is no retry and no idempotency key.

use crate::error::AppError;
use crate::models::{Equipment, LoanRequest, Role, Task, User};
use crate::navigation::{Destination, Navigation};
use crate::services::{encode_resource, Identity, ResourceHandle};
use crate::AppContext;
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use validator::{Validate, ValidationError, ValidationErrors};

const REQUIRED_FIELDS: &str = "Complete the required fields";

/// Rejects empty and whitespace-only input.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_role_fields(form: &RegistrationForm) -> Result<(), ValidationError> {
    if form.role == Role::Student
        && (form.student_id.trim().is_empty() || form.program.trim().is_empty())
    {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn has_code(errors: &ValidationErrors, code: &str) -> bool {
    errors
        .field_errors()
        .values()
        .any(|errs| errs.iter().any(|e| e.code == code))
}

/// Input of the loan request form.
#[derive(Debug, Clone, Default, Validate)]
pub struct LoanDraft {
    /// Free text, e.g. "31/12/2025"
    #[validate(custom(function = "not_blank"))]
    pub return_date: String,
}

impl LoanDraft {
    pub fn new(return_date: &str) -> Self {
        Self {
            return_date: return_date.to_string(),
        }
    }
}

/// Input of the new task form.
#[derive(Debug, Clone, Default, Validate)]
pub struct TaskDraft {
    pub description: String,
    #[validate(required)]
    pub image: Option<ResourceHandle>,
}

/// Input of the registration form.
#[derive(Debug, Clone, Default, Validate)]
#[validate(schema(function = "validate_role_fields"))]
pub struct RegistrationForm {
    #[validate(custom(function = "not_blank"), email(code = "email"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub password: String,
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    /// Required for students
    pub student_id: String,
    /// Required for students
    pub program: String,
    pub role: Role,
    pub photo: Option<ResourceHandle>,
}

impl RegistrationForm {
    /// Message for the first failing rule, if any.
    fn check(&self) -> Option<&'static str> {
        let errors = self.validate().err()?;
        if has_code(&errors, "blank") {
            Some(REQUIRED_FIELDS)
        } else if has_code(&errors, "email") {
            Some("Enter a valid email address")
        } else {
            Some(REQUIRED_FIELDS)
        }
    }
}

/// Result of one submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Rejected locally; no remote call was made
    Invalid(String),
    /// Another submission is still in flight
    Busy,
    /// The remote call failed; the screen should stay
    Failed(String),
    Submitted {
        id: String,
        navigation: Option<Navigation>,
    },
}

impl Outcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, Outcome::Submitted { .. })
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        match self {
            Outcome::Submitted { navigation, .. } => navigation.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FormState {
    message: Option<String>,
    submitting: bool,
}

/// Holds the `submitting` flag until dropped.
pub struct InFlight<'a> {
    form: &'a Mutex<FormState>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.form
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .submitting = false;
    }
}

/// Runs submissions for one screen and keeps its message line.
pub struct Submitter {
    ctx: Arc<AppContext>,
    form: Mutex<FormState>,
}

impl Submitter {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            form: Mutex::new(FormState::default()),
        }
    }

    /// Current user-visible message.
    pub fn message(&self) -> Option<String> {
        self.lock().message.clone()
    }

    pub fn set_message(&self, message: impl Into<String>) {
        self.lock().message = Some(message.into());
    }

    pub fn is_submitting(&self) -> bool {
        self.lock().submitting
    }

    /// Claim the `submitting` flag; `None` if a submission is in flight.
    pub fn try_begin(&self) -> Option<InFlight<'_>> {
        let mut form = self.lock();
        if form.submitting {
            return None;
        }
        form.submitting = true;
        Some(InFlight { form: &self.form })
    }

    /// Create a pending loan request for `equipment`.
    ///
    /// `requester` is the caller's profile, used for the denormalized
    /// requester fields.
    pub async fn submit_loan(
        &self,
        equipment: &Equipment,
        requester: Option<&User>,
        draft: &mut LoanDraft,
    ) -> Outcome {
        if draft.validate().is_err() {
            return self.invalid("Enter a return date.");
        }
        let Some(identity) = self.identity() else {
            return self.invalid(AppError::NotAuthenticated.to_string());
        };
        let Some(_guard) = self.try_begin() else {
            return Outcome::Busy;
        };

        let loan = LoanRequest::new_pending(
            equipment,
            &identity.uid,
            identity.email.as_deref(),
            requester,
            &draft.return_date,
            Utc::now(),
        );

        match self
            .ctx
            .store
            .add(&self.ctx.config.collections.loans, loan.to_fields())
            .await
        {
            Ok(id) => {
                tracing::info!(loan_id = %id, equipment_id = %equipment.id, "Loan request created");
                draft.return_date.clear();
                self.set_message("Request sent successfully");
                Outcome::Submitted {
                    id,
                    navigation: Some(
                        Navigation::to(Destination::LoanList)
                            .pop_up_to(Destination::LoanList, true),
                    ),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, equipment_id = %equipment.id, "Loan request failed");
                self.failed(format!("Error sending request: {}", e))
            }
        }
    }

    /// Create a task with the picked image.
    ///
    /// On success the draft is cleared and the screen stays.
    pub async fn submit_task(&self, draft: &mut TaskDraft) -> Outcome {
        if draft.validate().is_err() {
            return self.invalid("Select an image before sending.");
        }
        let Some(identity) = self.identity() else {
            return self.invalid(AppError::NotAuthenticated.to_string());
        };
        let Some(_guard) = self.try_begin() else {
            return Outcome::Busy;
        };

        let image = match &draft.image {
            Some(handle) => match encode_resource(self.ctx.picker.as_ref(), handle).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(error = %e, resource = %handle, "Could not read picked image");
                    return self.failed(format!("Error saving: {}", e));
                }
            },
            None => None,
        };

        let task = Task {
            description: draft.description.clone(),
            image,
            owner_id: identity.uid,
            timestamp: Utc::now(),
        };

        match self
            .ctx
            .store
            .add(&self.ctx.config.collections.tasks, task.to_fields())
            .await
        {
            Ok(id) => {
                tracing::info!(task_id = %id, "Task created");
                draft.description.clear();
                draft.image = None;
                self.set_message("Task sent successfully");
                Outcome::Submitted {
                    id,
                    navigation: None,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Task creation failed");
                self.failed(format!("Error saving: {}", e))
            }
        }
    }

    /// Create an account and its profile document.
    ///
    /// The profile is keyed by the new identity. Students land on the loan
    /// list, admins on the admin panel.
    pub async fn register(&self, form: &mut RegistrationForm) -> Outcome {
        form.email = form.email.trim().to_string();
        if let Some(message) = form.check() {
            return self.invalid(message);
        }
        let Some(_guard) = self.try_begin() else {
            return Outcome::Busy;
        };

        // Read the photo first so a bad file does not leave an account
        // without a profile.
        let photo = match &form.photo {
            Some(handle) => match encode_resource(self.ctx.picker.as_ref(), handle).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(error = %e, resource = %handle, "Could not read profile photo");
                    return self.failed(format!("Registration error: {}", e));
                }
            },
            None => String::new(),
        };

        let session = match self.ctx.auth.register(&form.email, &form.password).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Account registration failed");
                return self.failed(format!("Registration error: {}", e));
            }
        };

        let student = form.role == Role::Student;
        let user = User {
            uid: session.identity.uid.clone(),
            name: form.name.clone(),
            student_id: if student { form.student_id.clone() } else { String::new() },
            program: if student { form.program.clone() } else { String::new() },
            role: form.role,
            email: form.email.clone(),
            photo,
            created_at: Some(Utc::now()),
        };

        if let Err(e) = self
            .ctx
            .store
            .set(&self.ctx.config.collections.users, &user.uid, user.to_fields())
            .await
        {
            tracing::warn!(error = %e, uid = %user.uid, "Saving user profile failed");
            return self.failed(format!("Error saving user: {}", e));
        }

        tracing::info!(uid = %user.uid, role = user.role.as_str(), "User registered");
        form.password.clear();
        form.photo = None;
        self.set_message("Registration complete");

        let home = match user.role {
            Role::Student => Destination::LoanList,
            Role::Admin => Destination::AdminPanel,
        };
        Outcome::Submitted {
            id: user.uid,
            navigation: Some(Navigation::to(home).pop_up_to(Destination::Register, true)),
        }
    }

    fn identity(&self) -> Option<Identity> {
        self.ctx.auth.current_user()
    }

    fn invalid(&self, message: impl Into<String>) -> Outcome {
        let message = message.into();
        self.set_message(message.clone());
        Outcome::Invalid(message)
    }

    fn failed(&self, message: String) -> Outcome {
        self.set_message(message.clone());
        Outcome::Failed(message)
    }

    fn lock(&self) -> MutexGuard<'_, FormState> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
