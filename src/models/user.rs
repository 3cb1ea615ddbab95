// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile model.

use crate::models::{Document, Fields};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Field names of a user document.
pub mod fields {
    pub const NAME: &str = "name";
    pub const STUDENT_ID: &str = "studentId";
    pub const PROGRAM: &str = "program";
    pub const ROLE: &str = "role";
    pub const EMAIL: &str = "email";
    pub const PHOTO: &str = "photo";
    pub const CREATED_AT: &str = "createdAt";
}

/// Account role chosen at registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }

    /// Parse a stored role; anything unrecognized is treated as a student.
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            _ => Role::Student,
        }
    }
}

/// User profile stored in the users collection.
///
/// Keyed by the auth identity; written once at registration.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Auth user ID (also used as document ID)
    pub uid: String,
    pub name: String,
    /// Student card number (students only)
    pub student_id: String,
    /// Degree program (students only)
    pub program: String,
    pub role: Role,
    pub email: String,
    /// Base64-encoded profile photo, empty when none was picked
    pub photo: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_document(doc: &Document) -> Self {
        let f = &doc.fields;
        Self {
            uid: doc.id.clone(),
            name: f.str_or(fields::NAME, ""),
            student_id: f.str_or(fields::STUDENT_ID, ""),
            program: f.str_or(fields::PROGRAM, ""),
            role: f.get_str(fields::ROLE).map(Role::parse).unwrap_or_default(),
            email: f.str_or(fields::EMAIL, ""),
            photo: f.str_or(fields::PHOTO, ""),
            created_at: f.get_timestamp(fields::CREATED_AT),
        }
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with(fields::NAME, self.name.as_str())
            .with(fields::STUDENT_ID, self.student_id.as_str())
            .with(fields::PROGRAM, self.program.as_str())
            .with(fields::ROLE, self.role.as_str())
            .with(fields::EMAIL, self.email.as_str())
            .with(fields::PHOTO, self.photo.as_str())
            .with(fields::CREATED_AT, self.created_at)
    }
}
