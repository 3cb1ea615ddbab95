// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Navigation requests returned by flows for the host shell to carry out.

use std::fmt;

/// Screens a flow can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Login,
    Register,
    LoanList,
    /// Loan request screen; an empty ID opens the equipment chooser
    LoanRequest { equipment_id: String },
    TaskList,
    NewTask,
    AdminPanel,
}

impl Destination {
    /// Route string understood by the host router.
    pub fn route(&self) -> String {
        match self {
            Destination::Login => "login".to_string(),
            Destination::Register => "register".to_string(),
            Destination::LoanList => "loans".to_string(),
            Destination::LoanRequest { equipment_id } if equipment_id.is_empty() => {
                "loans/new".to_string()
            }
            Destination::LoanRequest { equipment_id } => format!("loans/{}", equipment_id),
            Destination::TaskList => "tasks".to_string(),
            Destination::NewTask => "task".to_string(),
            Destination::AdminPanel => "admin".to_string(),
        }
    }

    /// Parse a route string back into a destination.
    pub fn parse(route: &str) -> Option<Self> {
        let dest = match route {
            "login" => Destination::Login,
            "register" => Destination::Register,
            "loans" => Destination::LoanList,
            "loans/new" => Destination::LoanRequest {
                equipment_id: String::new(),
            },
            "tasks" => Destination::TaskList,
            "task" => Destination::NewTask,
            "admin" => Destination::AdminPanel,
            other => {
                let id = other.strip_prefix("loans/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Destination::LoanRequest {
                    equipment_id: id.to_string(),
                }
            }
        };
        Some(dest)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.route())
    }
}

/// A navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub to: Destination,
    /// Pop the history back to this entry first
    pub pop_up_to: Option<PopUpTo>,
}

/// History trimming attached to a [`Navigation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopUpTo {
    pub destination: Destination,
    /// Also remove `destination` itself, so back cannot return to it
    pub inclusive: bool,
}

impl Navigation {
    pub fn to(destination: Destination) -> Self {
        Self {
            to: destination,
            pop_up_to: None,
        }
    }

    pub fn pop_up_to(mut self, destination: Destination, inclusive: bool) -> Self {
        self.pop_up_to = Some(PopUpTo {
            destination,
            inclusive,
        });
        self
    }
}
