use chrono::{DateTime, Utc};
use internship_core_api::{ApprovalAction, ApprovalStatus, PrincipalRef};
use serde::{Deserialize, Serialize};

/// # Documentation
/// - One approval per student enrollment.
/// - `version` is bumped on every write; updates are conditional on the version read.
/// - `last_actor` together with `status` identifies the most recent transition and
///   lets repeated requests be absorbed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalModel {
    pub id: i64,
    pub student_enroll_id: i64,
    pub student_id: i64,
    pub status: ApprovalStatus,
    pub advisor_id: Option<i64>,
    pub committee_id: Option<i64>,
    pub registered_at: DateTime<Utc>,
    pub advisor_decided_at: Option<DateTime<Utc>>,
    pub committee_decided_at: Option<DateTime<Utc>>,
    pub withdrawn_at: Option<DateTime<Utc>>,
    pub advisor_reason: Option<String>,
    pub committee_reason: Option<String>,
    pub withdraw_reason: Option<String>,
    pub last_actor: Option<PrincipalRef>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApproval {
    pub student_enroll_id: i64,
    pub student_id: i64,
    pub advisor_id: Option<i64>,
    pub committee_id: Option<i64>,
    pub registered_at: DateTime<Utc>,
}

/// Append-only history row written for every applied transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovalTransitionModel {
    pub id: i64,
    pub approval_id: i64,
    pub action: ApprovalAction,
    pub from_status: ApprovalStatus,
    pub to_status: ApprovalStatus,
    pub actor: PrincipalRef,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewApprovalTransition {
    pub approval_id: i64,
    pub action: ApprovalAction,
    pub from_status: ApprovalStatus,
    pub to_status: ApprovalStatus,
    pub actor: PrincipalRef,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Listing filter. Every set field narrows the result; `advisor_id` is matched
/// through the enrollment row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApprovalFilter {
    pub advisor_id: Option<i64>,
    pub committee_id: Option<i64>,
    pub student_id: Option<i64>,
    pub status: Option<ApprovalStatus>,
}
