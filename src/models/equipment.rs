// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Equipment reference data (read-only from this client).

use crate::models::Document;

/// Field names of an equipment document.
pub mod fields {
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE: &str = "image";
}

/// A piece of lendable equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Equipment {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Base64-encoded picture, if any
    pub image: Option<String>,
}

impl Equipment {
    pub fn from_document(doc: &Document) -> Self {
        let f = &doc.fields;
        Self {
            id: doc.id.clone(),
            name: f.str_or(fields::NAME, "(unnamed)"),
            description: f.str_or(fields::DESCRIPTION, ""),
            image: f.non_blank_str(fields::IMAGE).map(str::to_string),
        }
    }
}
