use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Seat allowance the ledger holds for one named guest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestAllowance {
    pub name: String,
    pub head_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllowanceError {
    #[error("guest name is empty")]
    EmptyName,
    #[error("head count must be at least 1, got {0}")]
    NoSeats(u32),
}

impl GuestAllowance {
    pub fn validate(&self) -> Result<(), AllowanceError> {
        if self.name.trim().is_empty() {
            return Err(AllowanceError::EmptyName);
        }
        if self.head_count < 1 {
            return Err(AllowanceError::NoSeats(self.head_count));
        }
        Ok(())
    }

    pub fn seat_label(&self) -> String {
        if self.head_count == 1 {
            "1 seat".to_string()
        } else {
            format!("{} seats", self.head_count)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendanceDecision {
    Yes,
    No,
}

impl AttendanceDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            AttendanceDecision::Yes => "Yes",
            AttendanceDecision::No => "No",
        }
    }
}

impl fmt::Display for AttendanceDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected yes or no, got '{0}'")]
pub struct ParseDecisionError(pub String);

impl FromStr for AttendanceDecision {
    type Err = ParseDecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(AttendanceDecision::Yes),
            "no" | "n" => Ok(AttendanceDecision::No),
            _ => Err(ParseDecisionError(s.to_string())),
        }
    }
}
