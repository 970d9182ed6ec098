use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::principal::PrincipalKind;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "tracker_kind", rename_all = "snake_case"))]
pub enum TrackerKind {
    StudentCompany,
    VisitorStudent,
    VisitorCompany,
}

impl TrackerKind {
    /// Every training carries exactly one tracker of each kind.
    pub const ALL: [TrackerKind; 3] = [
        TrackerKind::StudentCompany,
        TrackerKind::VisitorStudent,
        TrackerKind::VisitorCompany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerKind::StudentCompany => "student_company",
            TrackerKind::VisitorStudent => "visitor_student",
            TrackerKind::VisitorCompany => "visitor_company",
        }
    }

    /// Kind of principal allowed to evaluate this obligation.
    pub fn evaluator_kind(&self) -> PrincipalKind {
        match self {
            TrackerKind::StudentCompany => PrincipalKind::Student,
            TrackerKind::VisitorStudent | TrackerKind::VisitorCompany => PrincipalKind::SuperAdmin,
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CoreError::validation("kind", format!("unknown evaluation kind '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "tracker_status", rename_all = "snake_case"))]
pub enum TrackerStatus {
    Pending,
    InProgress,
    Completed,
    Overdue,
}

impl TrackerStatus {
    pub const ALL: [TrackerStatus; 4] = [
        TrackerStatus::Pending,
        TrackerStatus::InProgress,
        TrackerStatus::Completed,
        TrackerStatus::Overdue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackerStatus::Pending => "pending",
            TrackerStatus::InProgress => "in_progress",
            TrackerStatus::Completed => "completed",
            TrackerStatus::Overdue => "overdue",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == TrackerStatus::Completed
    }

    /// Candidates for the overdue sweep, given their due date has passed.
    pub fn is_sweepable(&self) -> bool {
        matches!(self, TrackerStatus::Pending | TrackerStatus::InProgress)
    }

    /// Status after an evaluator is bound. Only `pending` moves forward.
    pub fn after_assignment(self) -> CoreResult<TrackerStatus> {
        match self {
            TrackerStatus::Completed => Err(CoreError::AlreadyFinal(self.to_string())),
            TrackerStatus::Pending => Ok(TrackerStatus::InProgress),
            other => Ok(other),
        }
    }

    pub fn complete(self) -> CoreResult<TrackerStatus> {
        match self {
            TrackerStatus::Completed => Err(CoreError::AlreadyFinal(self.to_string())),
            _ => Ok(TrackerStatus::Completed),
        }
    }
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackerStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackerStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::validation("status", format!("unknown evaluation status '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    AllCompleted,
    HasOverdue,
    InProgress,
    Pending,
}

impl OverallStatus {
    pub fn derive(statuses: &[TrackerStatus]) -> Self {
        if !statuses.is_empty() && statuses.iter().all(|s| *s == TrackerStatus::Completed) {
            OverallStatus::AllCompleted
        } else if statuses.contains(&TrackerStatus::Overdue) {
            OverallStatus::HasOverdue
        } else if statuses.contains(&TrackerStatus::InProgress) {
            OverallStatus::InProgress
        } else {
            OverallStatus::Pending
        }
    }
}

/// Percentage of completed trackers over the fixed three kinds, two decimal places.
pub fn completion_rate(statuses: &[TrackerStatus]) -> Decimal {
    let completed = statuses
        .iter()
        .filter(|s| **s == TrackerStatus::Completed)
        .count();
    let total = TrackerKind::ALL.len();
    (Decimal::from(completed as u64) * Decimal::ONE_HUNDRED / Decimal::from(total as u64)).round_dp(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "document_language", rename_all = "snake_case"))]
pub enum DocumentLanguage {
    Th,
    En,
}
