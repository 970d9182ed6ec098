use std::sync::Arc;

use chrono::{DateTime, Utc};
use internship_core_api::{
    ApprovalStatus, AuditAction, AuditSubject, ContactBlock, CoreError, CoreResult,
    NotificationCategory, PrincipalRef, RegisterTrainingRequest, SubjectKind, TrackerKind,
    ABILITY_EVALUATIONS_ASSIGN, ABILITY_EVALUATIONS_MANAGE,
};
use internship_core_db::models::{ContactInfo, NewTracker, NewTraining, TrackerModel, TrainingModel};
use internship_core_db::repository::{Store, UnitOfWork};
use serde_json::json;
use tracing::{info, instrument};

use crate::audit::{AuditEvent, AuditWriter};
use crate::auth::Session;
use crate::clock::Clock;
use crate::context::RequestContext;
use crate::outbox::Outbox;

fn contact(block: ContactBlock) -> ContactInfo {
    ContactInfo {
        name: block.name,
        phone: block.phone,
        email: block.email,
        position: block.position,
    }
}

pub struct EvaluationTracker {
    pub(super) store: Arc<dyn Store>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) audit: AuditWriter,
    pub(super) outbox: Outbox,
}

impl EvaluationTracker {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            audit: AuditWriter::new(clock.clone()),
            outbox: Outbox::new(clock.clone()),
            clock,
        }
    }

    pub(super) async fn load(&self, uow: &dyn UnitOfWork, tracker_id: i64) -> CoreResult<TrackerModel> {
        uow.trackers()
            .find_by_id(tracker_id)
            .await?
            .ok_or_else(|| CoreError::not_found("tracker", tracker_id))
    }

    /// Record the placement of an approved enrollment and open its three
    /// trackers, all in one transaction.
    ///
    /// Registered by the enrollment's student or an `evaluations.manage`
    /// holder.
    #[instrument(skip_all, fields(enrollment = request.student_enroll_id))]
    pub async fn register_training(
        &self,
        ctx: &RequestContext,
        session: &Session,
        request: RegisterTrainingRequest,
    ) -> CoreResult<TrainingModel> {
        if request.start_date > request.end_date {
            return Err(CoreError::validation("start_date", "must not be after end_date"));
        }
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let enrollment = uow
                .enrollments()
                .find_by_id(request.student_enroll_id)
                .await?
                .ok_or_else(|| CoreError::not_found("enrollment", request.student_enroll_id))?;
            if session.principal != PrincipalRef::student(enrollment.student_id) {
                session.require(ABILITY_EVALUATIONS_MANAGE)?;
            }
            let status = uow
                .approvals()
                .find_by_enrollment(enrollment.id)
                .await?
                .map(|approval| approval.status);
            if status != Some(ApprovalStatus::Approved) {
                return Err(CoreError::IllegalTransition {
                    from: status.map_or("unregistered".to_string(), |s| s.to_string()),
                    action: "register_training".to_string(),
                });
            }

            let training = uow
                .trainings()
                .create(NewTraining {
                    student_enroll_id: enrollment.id,
                    company_id: request.company_id,
                    start_date: request.start_date,
                    end_date: request.end_date,
                    coordinator: contact(request.coordinator),
                    supervisor: contact(request.supervisor),
                    position: request.position,
                    department: request.department,
                    job_description: request.job_description,
                    document_language: request.document_language,
                })
                .await?;
            let trackers = uow
                .trackers()
                .create_batch(
                    TrackerKind::ALL
                        .into_iter()
                        .map(|kind| NewTracker {
                            training_id: training.id,
                            kind,
                        })
                        .collect(),
                )
                .await?;
            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::TrainingRegistered,
                        AuditSubject::new(SubjectKind::Training, training.id),
                    )
                    .actor(session.principal)
                    .metadata(json!({
                        "student_enroll_id": enrollment.id,
                        "trackers": trackers.iter().map(|t| t.id).collect::<Vec<_>>(),
                    })),
                )
                .await?;
            uow.commit().await?;
            info!(training = training.id, "Training registered");
            Ok(training)
        })
        .await
    }

    /// Bind an evaluator to a tracker and optionally set its due date.
    ///
    /// The evaluator's kind follows the tracker kind: the student for
    /// `student_company`, a SuperAdmin for the visitor kinds.
    #[instrument(skip_all, fields(tracker = tracker_id, evaluator = evaluator_id))]
    pub async fn assign(
        &self,
        ctx: &RequestContext,
        session: &Session,
        tracker_id: i64,
        evaluator_id: i64,
        due_at: Option<DateTime<Utc>>,
    ) -> CoreResult<TrackerModel> {
        session.require(ABILITY_EVALUATIONS_ASSIGN)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let mut tracker = self.load(uow.as_ref(), tracker_id).await?;
            let evaluator = PrincipalRef::new(tracker.kind.evaluator_kind(), evaluator_id);
            uow.principals()
                .find_by_ref(evaluator)
                .await?
                .ok_or_else(|| CoreError::not_found(evaluator.kind.as_str(), evaluator_id))?;

            let now = self.clock.now();
            tracker.status = tracker.status.after_assignment()?;
            tracker.evaluator = Some(evaluator);
            tracker.due_at = due_at.or(tracker.due_at);
            tracker.assigned_at = Some(now);
            tracker.updated_at = now;
            let tracker = uow.trackers().update(&tracker).await?;

            self.audit
                .record(
                    uow.as_ref(),
                    ctx,
                    AuditEvent::new(
                        AuditAction::EvaluatorAssigned,
                        AuditSubject::new(SubjectKind::Tracker, tracker.id),
                    )
                    .actor(session.principal)
                    .metadata(json!({ "evaluator": evaluator.subject(), "due_at": tracker.due_at })),
                )
                .await?;
            self.outbox
                .enqueue(
                    uow.as_ref(),
                    evaluator,
                    NotificationCategory::EvaluatorAssigned,
                    json!({
                        "tracker_id": tracker.id,
                        "training_id": tracker.training_id,
                        "kind": tracker.kind,
                        "due_at": tracker.due_at,
                    }),
                )
                .await?;
            uow.commit().await?;
            Ok(tracker)
        })
        .await
    }

    /// Complete the tracker of `kind` on a training.
    pub async fn mark_completed(
        &self,
        ctx: &RequestContext,
        session: &Session,
        training_id: i64,
        kind: TrackerKind,
        remarks: Option<String>,
    ) -> CoreResult<TrackerModel> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let tracker = uow
                .trackers()
                .find_by_training_and_kind(training_id, kind)
                .await?
                .ok_or_else(|| CoreError::not_found("tracker", format!("{training_id}/{kind}")))?;
            self.complete_in(uow, ctx, session, tracker, remarks).await
        })
        .await
    }

    /// Complete a tracker by id. `remarks`, when given, replaces the stored
    /// remarks; otherwise they are left as they were.
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        session: &Session,
        tracker_id: i64,
        remarks: Option<String>,
    ) -> CoreResult<TrackerModel> {
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let tracker = self.load(uow.as_ref(), tracker_id).await?;
            self.complete_in(uow, ctx, session, tracker, remarks).await
        })
        .await
    }

    #[instrument(skip_all, fields(tracker = tracker.id, principal = %session.principal))]
    async fn complete_in(
        &self,
        uow: Box<dyn UnitOfWork>,
        ctx: &RequestContext,
        session: &Session,
        mut tracker: TrackerModel,
        remarks: Option<String>,
    ) -> CoreResult<TrackerModel> {
        if tracker.evaluator != Some(session.principal) {
            session.require(ABILITY_EVALUATIONS_MANAGE)?;
        }
        let from = tracker.status;
        let now = self.clock.now();
        tracker.status = tracker.status.complete()?;
        tracker.completed_at = Some(now);
        tracker.updated_at = now;
        if remarks.is_some() {
            tracker.remarks = remarks;
        }
        let tracker = uow.trackers().update(&tracker).await?;

        self.audit
            .record(
                uow.as_ref(),
                ctx,
                AuditEvent::new(
                    AuditAction::EvaluationCompleted,
                    AuditSubject::new(SubjectKind::Tracker, tracker.id),
                )
                .actor(session.principal)
                .metadata(json!({ "kind": tracker.kind, "from": from })),
            )
            .await?;
        uow.commit().await?;
        Ok(tracker)
    }

    /// Promote past-due trackers to `overdue` within `uow`.
    ///
    /// Each promoted tracker with an evaluator queues a notification. Returns
    /// the promoted rows; an empty result leaves no trace.
    pub async fn promote_overdue(
        &self,
        uow: &dyn UnitOfWork,
        ctx: &RequestContext,
        actor: Option<PrincipalRef>,
    ) -> CoreResult<Vec<TrackerModel>> {
        let promoted = uow.trackers().mark_overdue(self.clock.now()).await?;
        if promoted.is_empty() {
            return Ok(promoted);
        }
        for tracker in &promoted {
            if let Some(evaluator) = tracker.evaluator {
                self.outbox
                    .enqueue(
                        uow,
                        evaluator,
                        NotificationCategory::EvaluationOverdue,
                        json!({
                            "tracker_id": tracker.id,
                            "training_id": tracker.training_id,
                            "kind": tracker.kind,
                            "due_at": tracker.due_at,
                        }),
                    )
                    .await?;
            }
        }
        let mut event = AuditEvent::new(AuditAction::EvaluationsOverdue, AuditSubject::system())
            .metadata(json!({ "trackers": promoted.iter().map(|t| t.id).collect::<Vec<_>>() }));
        if let Some(actor) = actor {
            event = event.actor(actor);
        }
        self.audit.record(uow, ctx, event).await?;
        info!(count = promoted.len(), "Trackers promoted to overdue");
        Ok(promoted)
    }

    /// Run the overdue sweep on demand.
    #[instrument(skip_all, fields(principal = %session.principal))]
    pub async fn sweep_overdue(&self, ctx: &RequestContext, session: &Session) -> CoreResult<Vec<TrackerModel>> {
        session.require(ABILITY_EVALUATIONS_MANAGE)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let promoted = self
                .promote_overdue(uow.as_ref(), ctx, Some(session.principal))
                .await?;
            uow.commit().await?;
            Ok(promoted)
        })
        .await
    }
}
