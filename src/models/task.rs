// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task model.

use crate::models::{Fields, Record};
use chrono::{DateTime, Utc};

/// Field names of a task document.
pub mod fields {
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE: &str = "image";
    pub const OWNER_ID: &str = "ownerId";
    pub const TIMESTAMP: &str = "timestamp";
}

/// A task submitted with an attached picture.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub description: String,
    /// Base64-encoded picture; omitted from the document when `None`
    pub image: Option<String>,
    /// Owner reference
    pub owner_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Task {
    pub fn to_fields(&self) -> Fields {
        let mut doc = Fields::new()
            .with(fields::DESCRIPTION, self.description.as_str())
            .with(fields::OWNER_ID, self.owner_id.as_str())
            .with(fields::TIMESTAMP, self.timestamp);
        if let Some(image) = &self.image {
            doc.insert(fields::IMAGE, image.as_str());
        }
        doc
    }
}

/// Display view of a task list row.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSummary {
    pub id: String,
    pub description: String,
    pub image: Option<String>,
}

impl TaskSummary {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id().to_string(),
            description: record.str_or(fields::DESCRIPTION, "(no description)"),
            image: record.non_blank_str(fields::IMAGE).map(str::to_string),
        }
    }
}
