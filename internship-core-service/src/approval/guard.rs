use internship_core_api::{
    ApprovalAction, CoreError, CoreResult, PrincipalKind, PrincipalRef, ABILITY_APPROVALS_DECIDE,
    ABILITY_APPROVALS_OVERRIDE, ABILITY_APPROVALS_WITHDRAW,
};
use internship_core_db::models::ApprovalModel;

use crate::auth::Session;

fn is_super_admin(principal: PrincipalRef, id: Option<i64>) -> bool {
    principal.kind == PrincipalKind::SuperAdmin && Some(principal.id) == id
}

/// Who may apply `action` to `approval`.
///
/// Holders of `approvals.override` pass every guard.
pub(super) fn authorize(session: &Session, approval: &ApprovalModel, action: ApprovalAction) -> CoreResult<()> {
    if session.has_ability(ABILITY_APPROVALS_OVERRIDE) {
        return Ok(());
    }
    let actor = session.principal;
    match action {
        ApprovalAction::AdvisorApprove | ApprovalAction::AdvisorReject => {
            session.require(ABILITY_APPROVALS_DECIDE)?;
            if !is_super_admin(actor, approval.advisor_id) {
                return Err(CoreError::permission_denied("not the advisor of record"));
            }
        }
        ApprovalAction::CommitteeApprove | ApprovalAction::CommitteeReject => {
            session.require(ABILITY_APPROVALS_DECIDE)?;
            if approval.committee_id.is_none() {
                return Err(CoreError::permission_denied("no committee assigned"));
            }
            if !is_super_admin(actor, approval.committee_id) {
                return Err(CoreError::permission_denied("not a member of the assigned committee"));
            }
        }
        ApprovalAction::Withdraw => {
            session.require(ABILITY_APPROVALS_WITHDRAW)?;
            if actor != PrincipalRef::student(approval.student_id) {
                return Err(CoreError::permission_denied("not the student of record"));
            }
        }
    }
    Ok(())
}

/// Parties of an approval may read it.
pub(super) fn can_read(session: &Session, approval: &ApprovalModel) -> bool {
    let actor = session.principal;
    session.has_ability(ABILITY_APPROVALS_OVERRIDE)
        || actor == PrincipalRef::student(approval.student_id)
        || is_super_admin(actor, approval.advisor_id)
        || is_super_admin(actor, approval.committee_id)
}
