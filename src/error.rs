// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types shared across the client core.

use crate::config::ConfigError;

/// Failures reported by a [`DocumentStore`](crate::db::DocumentStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Store error: {0}")]
    Backend(String),

    #[error("Database not connected (offline mode)")]
    Offline,
}

/// Failures reported by an [`AuthService`](crate::services::AuthService).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailExists,

    #[error("Auth service error: {0}")]
    Backend(String),
}

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True for failures that came back from a remote collaborator.
    pub fn is_remote(&self) -> bool {
        matches!(self, AppError::Store(_) | AppError::Auth(_))
    }
}

/// Result type alias for fallible operations in this crate.
pub type Result<T> = std::result::Result<T, AppError>;
