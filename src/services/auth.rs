// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authentication seam.
//!
//! The identity returned by [`AuthService::current_user`] scopes every owner
//! query and is stamped on every created document.

use crate::error::AuthError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// The authenticated user, as far as this client is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Auth user ID; used as owner reference and as the user document key
    pub uid: String,
    pub email: Option<String>,
}

/// A signed-in session.
#[derive(Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    /// Bearer token for backend calls
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service operations used by the client.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// The signed-in identity, if any.
    fn current_user(&self) -> Option<Identity>;

    /// Sign in with email and password; the new session becomes current.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Create an account; the new session becomes current.
    async fn register(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Forget the current session.
    fn sign_out(&self);
}

/// Auth operation kinds, for call recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOp {
    SignIn,
    Register,
}

#[derive(Default)]
struct MemoryAuthState {
    /// email -> (password, uid)
    accounts: HashMap<String, (String, String)>,
    current: Option<Identity>,
    calls: Vec<(AuthOp, String)>,
    register_failure: Option<AuthError>,
}

/// In-process [`AuthService`] for tests and offline runs.
#[derive(Default)]
pub struct MemoryAuth {
    state: Mutex<MemoryAuthState>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service with `uid` already signed in.
    pub fn signed_in(uid: &str, email: &str) -> Self {
        let auth = Self::new();
        {
            let mut state = auth.lock();
            state
                .accounts
                .insert(email.to_string(), (String::new(), uid.to_string()));
            state.current = Some(Identity {
                uid: uid.to_string(),
                email: Some(email.to_string()),
            });
        }
        auth
    }

    /// Register an account without signing it in.
    pub fn add_account(&self, email: &str, password: &str, uid: &str) {
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), uid.to_string()));
    }

    /// Make every subsequent `register` fail with `err`.
    pub fn fail_register(&self, err: AuthError) {
        self.lock().register_failure = Some(err);
    }

    /// Recorded calls as (operation, email), oldest first.
    pub fn calls(&self) -> Vec<(AuthOp, String)> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryAuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_for(identity: Identity) -> Session {
        Session {
            id_token: format!("memory-token-{}", identity.uid),
            refresh_token: String::new(),
            expires_at: Utc::now() + chrono::Duration::hours(1),
            identity,
        }
    }
}

#[async_trait]
impl AuthService for MemoryAuth {
    fn current_user(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut state = self.lock();
        state.calls.push((AuthOp::SignIn, email.to_string()));

        let uid = match state.accounts.get(email) {
            Some((stored, uid)) if stored == password => uid.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        let identity = Identity {
            uid,
            email: Some(email.to_string()),
        };
        state.current = Some(identity.clone());
        Ok(Self::session_for(identity))
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let mut state = self.lock();
        state.calls.push((AuthOp::Register, email.to_string()));

        if let Some(err) = &state.register_failure {
            return Err(err.clone());
        }
        if state.accounts.contains_key(email) {
            return Err(AuthError::EmailExists);
        }

        let uid = format!("uid{:04}", state.accounts.len() + 1);
        state
            .accounts
            .insert(email.to_string(), (password.to_string(), uid.clone()));
        let identity = Identity {
            uid,
            email: Some(email.to_string()),
        };
        state.current = Some(identity.clone());
        Ok(Self::session_for(identity))
    }

    fn sign_out(&self) {
        self.lock().current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_sign_in() {
        let auth = MemoryAuth::new();
        assert!(auth.current_user().is_none());

        let session = auth.register("ana@example.com", "secret").await.unwrap();
        assert_eq!(auth.current_user(), Some(session.identity.clone()));

        auth.sign_out();
        assert!(auth.current_user().is_none());

        let again = auth.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(again.identity.uid, session.identity.uid);
        assert_eq!(
            auth.sign_in("ana@example.com", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        );
        assert_eq!(
            auth.register("ana@example.com", "x").await.unwrap_err(),
            AuthError::EmailExists
        );
    }
}
