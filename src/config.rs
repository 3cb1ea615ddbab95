//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;

const DEFAULT_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase / GCP project ID
    pub project_id: String,
    /// Firebase Web API key (sent with every Auth REST call)
    pub api_key: String,
    /// Base URL of the Identity Toolkit REST API
    pub auth_url: String,
    /// Collection names
    pub collections: Collections,
    /// Account the headless client signs in with
    pub email: String,
    pub password: String,
}

/// Names of the remote collections this client reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collections {
    pub users: String,
    pub equipment: String,
    pub loans: String,
    pub tasks: String,
}

impl Default for Collections {
    fn default() -> Self {
        use crate::db::collections;
        Self {
            users: collections::USERS.to_string(),
            equipment: collections::EQUIPMENT.to_string(),
            loans: collections::LOANS.to_string(),
            tasks: collections::TASKS.to_string(),
        }
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            project_id: "test-project".to_string(),
            api_key: "test_api_key".to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            collections: Collections::default(),
            email: String::new(),
            password: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = Collections::default();

        Ok(Self {
            project_id: env::var("FIREBASE_PROJECT_ID")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_PROJECT_ID"))?,
            api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            auth_url: env::var("FIREBASE_AUTH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),
            collections: Collections {
                users: env::var("USERS_COLLECTION").unwrap_or(defaults.users),
                equipment: env::var("EQUIPMENT_COLLECTION").unwrap_or(defaults.equipment),
                loans: env::var("LOANS_COLLECTION").unwrap_or(defaults.loans),
                tasks: env::var("TASKS_COLLECTION").unwrap_or(defaults.tasks),
            },
            email: env::var("LOAN_DESK_EMAIL")
                .map(|v| v.trim().to_string())
                .unwrap_or_default(),
            password: env::var("LOAN_DESK_PASSWORD").unwrap_or_default(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
