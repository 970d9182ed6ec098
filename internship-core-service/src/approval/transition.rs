use internship_core_api::{
    ApprovalAction, AuditAction, AuditSubject, CoreResult, NotificationCategory, PrincipalRef,
    SubjectKind,
};
use internship_core_db::models::{ApprovalModel, NewApprovalTransition};
use serde_json::json;
use tracing::{debug, info, instrument};

use super::engine::ApprovalEngine;
use super::guard;
use crate::audit::AuditEvent;
use crate::auth::Session;
use crate::context::RequestContext;

impl ApprovalEngine {
    /// Apply `action` to approval `id` on behalf of the session's principal.
    ///
    /// Re-applying the last recorded transition with the same actor returns the
    /// approval unchanged. Otherwise the state is checked before the guard, so a
    /// terminal approval reports `AlreadyFinal` to anyone.
    #[instrument(skip_all, fields(approval = id, action = %action, principal = %session.principal))]
    pub async fn transition(
        &self,
        ctx: &RequestContext,
        session: &Session,
        id: i64,
        action: ApprovalAction,
        reason: Option<String>,
    ) -> CoreResult<ApprovalModel> {
        ctx.bounded(async {
            let actor = session.principal;
            let uow = self.store.begin().await?;
            let mut approval = self.load(uow.as_ref(), id).await?;

            if approval.status == action.target() && approval.last_actor == Some(actor) {
                debug!("Transition already applied");
                self.audit
                    .record(
                        uow.as_ref(),
                        ctx,
                        AuditEvent::new(
                            AuditAction::ApprovalTransitionRepeated,
                            AuditSubject::new(SubjectKind::Approval, id),
                        )
                        .actor(actor)
                        .metadata(json!({ "action": action.as_str(), "status": approval.status })),
                    )
                    .await?;
                uow.commit().await?;
                return Ok(approval);
            }

            let from = approval.status;
            let to = from.apply(action)?;
            guard::authorize(session, &approval, action)?;

            let now = self.clock.now();
            match action {
                ApprovalAction::AdvisorApprove | ApprovalAction::AdvisorReject => {
                    approval.advisor_decided_at = Some(now);
                    approval.advisor_reason = reason.clone();
                }
                ApprovalAction::CommitteeApprove | ApprovalAction::CommitteeReject => {
                    approval.committee_decided_at = Some(now);
                    approval.committee_reason = reason.clone();
                }
                ApprovalAction::Withdraw => {
                    approval.withdrawn_at = Some(now);
                    approval.withdraw_reason = reason.clone();
                }
            }
            approval.status = to;
            approval.last_actor = Some(actor);
            approval.updated_at = now;
            let approval = uow.approvals().update(&approval).await?;

            uow.approvals()
                .append_transition(NewApprovalTransition {
                    approval_id: id,
                    action,
                    from_status: from,
                    to_status: to,
                    actor,
                    reason: reason.clone(),
                    created_at: now,
                })
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::ApprovalTransitioned,
                        AuditSubject::new(SubjectKind::Approval, id),
                    )
                    .actor(actor)
                    .metadata(json!({ "action": action.as_str(), "from": from, "to": to })),
                )
                .await?;

            let recipient = match (action, approval.advisor_id) {
                (ApprovalAction::Withdraw, Some(advisor)) => Some(PrincipalRef::super_admin(advisor)),
                (ApprovalAction::Withdraw, None) => None,
                _ => Some(PrincipalRef::student(approval.student_id)),
            };
            if let Some(recipient) = recipient {
                self.outbox
                    .enqueue(
                        uow.as_ref(),
                        recipient,
                        NotificationCategory::ApprovalDecision,
                        json!({
                            "approval_id": id,
                            "action": action.as_str(),
                            "status": to,
                            "reason": reason,
                        }),
                    )
                    .await?;
            }
            uow.commit().await?;
            info!(from = %from, to = %to, "Approval transitioned");
            Ok(approval)
        })
        .await
    }
}
