use serde::Deserialize;
use validator::Validate;

use crate::domain::approval::{ApprovalRole, ApprovalStatus};

/// Optional reason attached to a decision or withdrawal.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct DecisionRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterApprovalRequest {
    #[validate(range(min = 1))]
    pub student_enroll_id: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignCommitteeRequest {
    #[validate(range(min = 1))]
    pub committee_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApprovalListQuery {
    pub role: Option<ApprovalRole>,
    pub status: Option<ApprovalStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
