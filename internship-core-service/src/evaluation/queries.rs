use internship_core_api::{
    CoreError, CoreResult, EvaluationListQuery, PrincipalRef, TrackerStatus,
    ABILITY_EVALUATIONS_MANAGE, ABILITY_EVALUATIONS_READ,
};
use internship_core_db::models::{TrackerCount, TrackerFilter, TrackerModel};
use internship_core_db::repository::{Page, PageRequest};
use tracing::instrument;

use super::summary::TrainingSummary;
use super::tracker::EvaluationTracker;
use crate::auth::Session;
use crate::context::RequestContext;
use crate::paging::page_request;

impl EvaluationTracker {
    /// Trackers of a training with their completion rate and overall status.
    ///
    /// Readable by the training's student, by any of its evaluators and by
    /// `evaluations.manage` holders.
    #[instrument(skip_all, fields(training = training_id))]
    pub async fn summary(
        &self,
        ctx: &RequestContext,
        session: &Session,
        training_id: i64,
    ) -> CoreResult<TrainingSummary> {
        session.require_any(&[ABILITY_EVALUATIONS_READ, ABILITY_EVALUATIONS_MANAGE])?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let training = uow
                .trainings()
                .find_by_id(training_id)
                .await?
                .ok_or_else(|| CoreError::not_found("training", training_id))?;
            let trackers = uow.trackers().find_by_training(training_id).await?;
            let student = uow
                .enrollments()
                .find_by_id(training.student_enroll_id)
                .await?
                .map(|enrollment| PrincipalRef::student(enrollment.student_id));
            uow.rollback().await?;

            let party = student == Some(session.principal)
                || trackers.iter().any(|t| t.evaluator == Some(session.principal));
            if !party && !session.has_ability(ABILITY_EVALUATIONS_MANAGE) {
                return Err(CoreError::permission_denied("not a party to this training"));
            }
            Ok(TrainingSummary::from_trackers(training_id, trackers))
        })
        .await
    }

    /// Trackers the session's principal evaluates, earliest due first.
    pub async fn assignments(
        &self,
        ctx: &RequestContext,
        session: &Session,
        page: PageRequest,
    ) -> CoreResult<Page<TrackerModel>> {
        session.require(ABILITY_EVALUATIONS_READ)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let trackers = uow.trackers().list_by_evaluator(session.principal, page).await?;
            uow.rollback().await?;
            Ok(trackers)
        })
        .await
    }

    pub async fn list_overdue(
        &self,
        ctx: &RequestContext,
        session: &Session,
        page: PageRequest,
    ) -> CoreResult<Page<TrackerModel>> {
        let filter = TrackerFilter {
            status: Some(TrackerStatus::Overdue),
            ..TrackerFilter::default()
        };
        self.list_filtered(ctx, session, filter, page).await
    }

    pub async fn list_by_kind(
        &self,
        ctx: &RequestContext,
        session: &Session,
        query: &EvaluationListQuery,
    ) -> CoreResult<Page<TrackerModel>> {
        let filter = TrackerFilter {
            kind: query.kind,
            status: query.status,
        };
        let page = page_request(query.page, query.page_size);
        self.list_filtered(ctx, session, filter, page).await
    }

    async fn list_filtered(
        &self,
        ctx: &RequestContext,
        session: &Session,
        filter: TrackerFilter,
        page: PageRequest,
    ) -> CoreResult<Page<TrackerModel>> {
        session.require(ABILITY_EVALUATIONS_MANAGE)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let trackers = uow.trackers().list(filter, page).await?;
            uow.rollback().await?;
            Ok(trackers)
        })
        .await
    }

    /// Tracker counts per kind and status.
    pub async fn stats(&self, ctx: &RequestContext, session: &Session) -> CoreResult<Vec<TrackerCount>> {
        session.require(ABILITY_EVALUATIONS_MANAGE)?;
        ctx.bounded(async {
            let uow = self.store.begin().await?;
            let counts = uow.trackers().count_by_kind_and_status().await?;
            uow.rollback().await?;
            Ok(counts)
        })
        .await
    }
}
