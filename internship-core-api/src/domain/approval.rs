use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "approval_status", rename_all = "snake_case"))]
pub enum ApprovalStatus {
    Registered,
    AdvisorApproved,
    Approved,
    Rejected,
    Withdrawn,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 5] = [
        ApprovalStatus::Registered,
        ApprovalStatus::AdvisorApproved,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
        ApprovalStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Registered => "registered",
            ApprovalStatus::AdvisorApproved => "advisor_approved",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
            ApprovalStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApprovalStatus::Approved | ApprovalStatus::Rejected | ApprovalStatus::Withdrawn
        )
    }

    /// Resolves the state reached by applying `action`, or the reason it cannot be applied.
    pub fn apply(self, action: ApprovalAction) -> CoreResult<ApprovalStatus> {
        if self.is_terminal() {
            return Err(CoreError::AlreadyFinal(self.to_string()));
        }
        let allowed = match action {
            ApprovalAction::AdvisorApprove | ApprovalAction::AdvisorReject => {
                self == ApprovalStatus::Registered
            }
            ApprovalAction::CommitteeApprove | ApprovalAction::CommitteeReject => {
                self == ApprovalStatus::AdvisorApproved
            }
            ApprovalAction::Withdraw => true,
        };
        if allowed {
            Ok(action.target())
        } else {
            Err(CoreError::IllegalTransition {
                from: self.to_string(),
                action: action.to_string(),
            })
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApprovalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::validation("status", format!("unknown approval status '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "approval_action", rename_all = "snake_case"))]
pub enum ApprovalAction {
    AdvisorApprove,
    AdvisorReject,
    CommitteeApprove,
    CommitteeReject,
    Withdraw,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::AdvisorApprove => "advisor_approve",
            ApprovalAction::AdvisorReject => "advisor_reject",
            ApprovalAction::CommitteeApprove => "committee_approve",
            ApprovalAction::CommitteeReject => "committee_reject",
            ApprovalAction::Withdraw => "withdraw",
        }
    }

    pub fn target(&self) -> ApprovalStatus {
        match self {
            ApprovalAction::AdvisorApprove => ApprovalStatus::AdvisorApproved,
            ApprovalAction::CommitteeApprove => ApprovalStatus::Approved,
            ApprovalAction::AdvisorReject | ApprovalAction::CommitteeReject => {
                ApprovalStatus::Rejected
            }
            ApprovalAction::Withdraw => ApprovalStatus::Withdrawn,
        }
    }

    pub fn is_advisor_decision(&self) -> bool {
        matches!(self, ApprovalAction::AdvisorApprove | ApprovalAction::AdvisorReject)
    }

    pub fn is_committee_decision(&self) -> bool {
        matches!(
            self,
            ApprovalAction::CommitteeApprove | ApprovalAction::CommitteeReject
        )
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ApprovalAction::AdvisorApprove,
            ApprovalAction::AdvisorReject,
            ApprovalAction::CommitteeApprove,
            ApprovalAction::CommitteeReject,
            ApprovalAction::Withdraw,
        ]
        .into_iter()
        .find(|action| action.as_str() == s)
        .ok_or_else(|| CoreError::MalformedRequest(format!("unknown approval action '{s}'")))
    }
}

/// Perspective from which approvals are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalRole {
    Advisor,
    Committee,
    Student,
}
