// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loan request model.

use crate::models::{Equipment, Fields, Record, User};
use chrono::{DateTime, Utc};

/// Field names of a loan request document.
pub mod fields {
    pub const EQUIPMENT_ID: &str = "equipmentId";
    pub const EQUIPMENT_NAME: &str = "equipmentName";
    pub const REQUESTER_ID: &str = "requesterId";
    pub const REQUEST_DATE: &str = "requestDate";
    pub const RETURN_DATE: &str = "returnDate";
    pub const STATUS: &str = "status";
    pub const REQUESTER_NAME: &str = "requesterName";
    pub const REQUESTER_PROGRAM: &str = "requesterProgram";
    pub const REQUESTER_PHOTO: &str = "requesterPhoto";
}

/// Initial (and, for this client, only) status of a loan request.
pub const STATUS_PENDING: &str = "pending";

/// A loan request as written to the loans collection.
///
/// The `equipment_name` and `requester_*` fields are copies taken at
/// submission time and are never refreshed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub equipment_id: String,
    pub equipment_name: String,
    /// Owner reference
    pub requester_id: String,
    pub request_date: DateTime<Utc>,
    /// Free text as typed by the user (e.g. "31/12/2025")
    pub return_date: String,
    pub status: String,
    pub requester_name: String,
    pub requester_program: String,
    pub requester_photo: String,
}

impl LoanRequest {
    /// Assemble a new pending request.
    ///
    /// `requester` is the caller's profile document, if one could be read;
    /// the name falls back to the caller's email.
    pub fn new_pending(
        equipment: &Equipment,
        requester_id: &str,
        requester_email: Option<&str>,
        requester: Option<&User>,
        return_date: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let requester_name = requester
            .map(|u| u.name.as_str())
            .filter(|n| !n.is_empty())
            .or(requester_email)
            .unwrap_or_default()
            .to_string();

        Self {
            equipment_id: equipment.id.clone(),
            equipment_name: equipment.name.clone(),
            requester_id: requester_id.to_string(),
            request_date: now,
            return_date: return_date.to_string(),
            status: STATUS_PENDING.to_string(),
            requester_name,
            requester_program: requester.map(|u| u.program.clone()).unwrap_or_default(),
            requester_photo: requester.map(|u| u.photo.clone()).unwrap_or_default(),
        }
    }

    pub fn to_fields(&self) -> Fields {
        Fields::new()
            .with(fields::EQUIPMENT_ID, self.equipment_id.as_str())
            .with(fields::EQUIPMENT_NAME, self.equipment_name.as_str())
            .with(fields::REQUESTER_ID, self.requester_id.as_str())
            .with(fields::REQUEST_DATE, self.request_date)
            .with(fields::RETURN_DATE, self.return_date.as_str())
            .with(fields::STATUS, self.status.as_str())
            .with(fields::REQUESTER_NAME, self.requester_name.as_str())
            .with(fields::REQUESTER_PROGRAM, self.requester_program.as_str())
            .with(fields::REQUESTER_PHOTO, self.requester_photo.as_str())
    }
}

/// Display view of a loan list row.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanSummary {
    pub id: String,
    pub equipment_name: String,
    pub return_date: String,
    pub status: String,
    pub requester_photo: Option<String>,
}

impl LoanSummary {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id().to_string(),
            equipment_name: record.str_or(fields::EQUIPMENT_NAME, "(no name)"),
            return_date: record.str_or(fields::RETURN_DATE, "(no date)"),
            status: record.str_or(fields::STATUS, STATUS_PENDING),
            requester_photo: record
                .non_blank_str(fields::REQUESTER_PHOTO)
                .map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn projector() -> Equipment {
        Equipment {
            id: "eq1".to_string(),
            name: "Projector".to_string(),
            description: String::new(),
            image: None,
        }
    }

    #[test]
    fn test_name_falls_back_to_email() {
        let loan = LoanRequest::new_pending(
            &projector(),
            "u1",
            Some("ana@example.com"),
            None,
            "31/12/2025",
            Utc::now(),
        );
        assert_eq!(loan.requester_name, "ana@example.com");
        assert_eq!(loan.requester_program, "");
        assert_eq!(loan.status, STATUS_PENDING);
    }

    #[test]
    fn test_denormalized_copies() {
        let user = User {
            uid: "u1".to_string(),
            name: "Ana".to_string(),
            student_id: "2021-001".to_string(),
            program: "Physics".to_string(),
            role: Role::Student,
            email: "ana@example.com".to_string(),
            photo: "aGk=".to_string(),
            created_at: None,
        };
        let loan = LoanRequest::new_pending(
            &projector(),
            "u1",
            Some("ana@example.com"),
            Some(&user),
            "31/12/2025",
            Utc::now(),
        );
        let f = loan.to_fields();

        assert_eq!(f.get_str(fields::EQUIPMENT_NAME), Some("Projector"));
        assert_eq!(f.get_str(fields::REQUESTER_NAME), Some("Ana"));
        assert_eq!(f.get_str(fields::REQUESTER_PROGRAM), Some("Physics"));
        assert_eq!(f.get_str(fields::REQUESTER_PHOTO), Some("aGk="));
        assert!(f.get_timestamp(fields::REQUEST_DATE).is_some());
    }
}
