// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firebase Auth client over the Identity Toolkit REST API.
//!
//! Handles:
//! - Email/password sign-in
//! - Email/password account creation
//! - Holding the current session in memory

use crate::config::Config;
use crate::error::AuthError;
use crate::services::auth::{AuthService, Identity, Session};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock};

/// Identity Toolkit REST client.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<Session>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    #[serde(default)]
    refresh_token: String,
    /// Lifetime in seconds, sent as a string
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuth {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.auth_url.clone(),
            api_key: config.api_key.clone(),
            session: RwLock::new(None),
        }
    }

    /// POST an email/password request to an `accounts:*` endpoint.
    async fn password_call(
        &self,
        endpoint: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let url = format!("{}/accounts:{}", self.base_url, endpoint);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await
            .map_err(|e| AuthError::Backend(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        let body: PasswordResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Backend(format!("JSON parse error: {}", e)))?;

        let lifetime = body
            .expires_in
            .as_deref()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(3600);

        let session = Session {
            identity: Identity {
                uid: body.local_id,
                email: body.email.or_else(|| Some(email.to_string())),
            },
            id_token: body.id_token,
            refresh_token: body.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        };

        *self.session.write().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
        tracing::info!(uid = %session.identity.uid, endpoint, "Auth session established");
        Ok(session)
    }
}

/// Map an Identity Toolkit error response to an [`AuthError`].
fn classify_error(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    // Messages may carry a suffix, e.g. "WEAK_PASSWORD : Password should be..."
    let code = message.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "EMAIL_EXISTS" => AuthError::EmailExists,
        _ => {
            tracing::warn!(status, message = %message, "Auth request rejected");
            AuthError::Backend(message)
        }
    }
}

#[async_trait]
impl AuthService for FirebaseAuth {
    fn current_user(&self) -> Option<Identity> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.identity.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn register(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.password_call("signUp", email, password).await
    }

    fn sign_out(&self) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
