// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Login screen: sign in, or create the account on first use.

use crate::navigation::{Destination, Navigation};
use crate::services::AuthService;
use std::sync::Arc;

pub struct SessionFlow {
    auth: Arc<dyn AuthService>,
    message: Option<String>,
}

impl SessionFlow {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        Self {
            auth,
            message: None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Sign in with `email` and `password`, registering them if sign-in
    /// fails.
    ///
    /// Does nothing while either field is empty. Returns the navigation to
    /// the task screen on success.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Option<Navigation> {
        if email.is_empty() || password.is_empty() {
            return None;
        }

        let result = match self.auth.sign_in(email, password).await {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::debug!(error = %e, "Sign-in failed, trying registration");
                self.auth.register(email, password).await
            }
        };

        match result {
            Ok(session) => {
                tracing::info!(uid = %session.identity.uid, "Signed in");
                self.message = None;
                Some(Navigation::to(Destination::NewTask).pop_up_to(Destination::Login, true))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sign-in and registration both failed");
                self.message = Some(e.to_string());
                None
            }
        }
    }
}
