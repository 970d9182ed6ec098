use std::sync::Arc;

use internship_core_api::{
    ApprovalListQuery, ApprovalRole, AuditAction, AuditSubject, CoreError, CoreResult, PrincipalKind,
    PrincipalRef, SubjectKind, ABILITY_APPROVALS_OVERRIDE, ABILITY_APPROVALS_READ,
};
use internship_core_db::models::{ApprovalFilter, ApprovalModel, ApprovalTransitionModel, NewApproval};
use internship_core_db::repository::{Page, Store, UnitOfWork};
use serde_json::json;
use tracing::{info, instrument};

use super::guard;
use crate::audit::{AuditEvent, AuditWriter};
use crate::auth::Session;
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::outbox::Outbox;
use crate::paging::page_request;

/// Drives approvals through their state machine and answers listings.
pub struct ApprovalEngine {
    pub(super) store: Arc<dyn Store>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) audit: AuditWriter,
    pub(super) outbox: Outbox,
}

impl ApprovalEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            audit: AuditWriter::new(clock.clone()),
            outbox: Outbox::new(clock.clone()),
            clock,
        }
    }

    pub(super) async fn load(&self, uow: &dyn UnitOfWork, id: i64) -> CoreResult<ApprovalModel> {
        uow.approvals()
            .find_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("approval", id))
    }

    /// Open the approval of an enrollment in `registered`.
    ///
    /// The student of the enrollment may register it, as may an override
    /// holder. The advisor is copied from the enrollment.
    #[instrument(skip_all, fields(principal = %session.principal, enrollment = student_enroll_id))]
    pub async fn register(
        &self,
        ctx: &RequestContext,
        session: &Session,
        student_enroll_id: i64,
    ) -> CoreResult<ApprovalModel> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let enrollment = uow
                .enrollments()
                .find_by_id(student_enroll_id)
                .await?
                .ok_or_else(|| CoreError::not_found("enrollment", student_enroll_id))?;
            if session.principal != PrincipalRef::student(enrollment.student_id)
                && !session.has_ability(ABILITY_APPROVALS_OVERRIDE)
            {
                return Err(CoreError::permission_denied("not the student of record"));
            }

            let approval = uow
                .approvals()
                .create(NewApproval {
                    student_enroll_id,
                    student_id: enrollment.student_id,
                    advisor_id: enrollment.advisor_id,
                    committee_id: None,
                    registered_at: self.clock.now(),
                })
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::ApprovalRegistered,
                        AuditSubject::new(SubjectKind::Approval, approval.id),
                    )
                    .actor(session.principal)
                    .metadata(json!({ "student_enroll_id": student_enroll_id })),
                )
                .await?;
            uow.commit().await?;
            info!(approval = approval.id, "Approval registered");
            Ok(approval)
        })
        .await
    }

    /// Set or replace the committee principal of a non-terminal approval.
    #[instrument(skip_all, fields(approval = id, committee = committee_id))]
    pub async fn assign_committee(
        &self,
        ctx: &RequestContext,
        session: &Session,
        id: i64,
        committee_id: i64,
    ) -> CoreResult<ApprovalModel> {
        session.require(ABILITY_APPROVALS_OVERRIDE)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let mut approval = self.load(uow.as_ref(), id).await?;
            if approval.status.is_terminal() {
                return Err(CoreError::AlreadyFinal(approval.status.to_string()));
            }
            uow.principals()
                .find_by_ref(PrincipalRef::super_admin(committee_id))
                .await?
                .ok_or_else(|| CoreError::not_found("super_admin", committee_id))?;

            let previous = approval.committee_id;
            approval.committee_id = Some(committee_id);
            approval.updated_at = self.clock.now();
            let approval = uow.approvals().update(&approval).await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::CommitteeAssigned,
                        AuditSubject::new(SubjectKind::Approval, id),
                    )
                    .actor(session.principal)
                    .metadata(json!({ "committee_id": committee_id, "previous": previous })),
                )
                .await?;
            uow.commit().await?;
            Ok(approval)
        })
        .await
    }

    #[instrument(skip_all, fields(approval = id))]
    pub async fn get(&self, ctx: &RequestContext, session: &Session, id: i64) -> CoreResult<ApprovalModel> {
        session.require_any(&[ABILITY_APPROVALS_READ, ABILITY_APPROVALS_OVERRIDE])?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let approval = self.load(uow.as_ref(), id).await?;
            uow.rollback().await?;
            if !guard::can_read(session, &approval) {
                return Err(CoreError::permission_denied("not a party to this approval"));
            }
            Ok(approval)
        })
        .await
    }

    /// Transitions of an approval, oldest first.
    #[instrument(skip_all, fields(approval = id))]
    pub async fn history(
        &self,
        ctx: &RequestContext,
        session: &Session,
        id: i64,
    ) -> CoreResult<Vec<ApprovalTransitionModel>> {
        session.require_any(&[ABILITY_APPROVALS_READ, ABILITY_APPROVALS_OVERRIDE])?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let approval = self.load(uow.as_ref(), id).await?;
            if !guard::can_read(session, &approval) {
                return Err(CoreError::permission_denied("not a party to this approval"));
            }
            let history = uow.approvals().history(id).await?;
            uow.rollback().await?;
            Ok(history)
        })
        .await
    }

    /// List approvals from the perspective named by `query.role`.
    ///
    /// Each role lists the session's own approvals. Without a role the listing
    /// is by status alone and needs `approvals.override`.
    #[instrument(skip_all, fields(principal = %session.principal, role = ?query.role))]
    pub async fn list(
        &self,
        ctx: &RequestContext,
        session: &Session,
        query: &ApprovalListQuery,
    ) -> CoreResult<Page<ApprovalModel>> {
        let filter = list_filter(session, query)?;
        let page = page_request(query.page, query.page_size);
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let approvals = uow.approvals().list(filter, page).await?;
            uow.rollback().await?;
            Ok(approvals)
        })
        .await
    }
}

fn list_filter(session: &Session, query: &ApprovalListQuery) -> CoreResult<ApprovalFilter> {
    let actor = session.principal;
    let mut filter = ApprovalFilter {
        status: query.status,
        ..ApprovalFilter::default()
    };
    match query.role {
        Some(ApprovalRole::Advisor) | Some(ApprovalRole::Committee) => {
            session.require_any(&[ABILITY_APPROVALS_READ, ABILITY_APPROVALS_OVERRIDE])?;
            if actor.kind != PrincipalKind::SuperAdmin {
                return Err(CoreError::permission_denied("only staff decide approvals"));
            }
            if query.role == Some(ApprovalRole::Advisor) {
                filter.advisor_id = Some(actor.id);
            } else {
                filter.committee_id = Some(actor.id);
            }
        }
        Some(ApprovalRole::Student) => {
            session.require(ABILITY_APPROVALS_READ)?;
            if actor.kind != PrincipalKind::Student {
                return Err(CoreError::permission_denied("not a student"));
            }
            filter.student_id = Some(actor.id);
        }
        None => session.require(ABILITY_APPROVALS_OVERRIDE)?,
    }
    Ok(filter)
}
