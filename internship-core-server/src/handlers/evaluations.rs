use axum::extract::State;
use internship_core_api::{
    AssignEvaluatorRequest, CompleteEvaluationRequest, EvaluationListQuery, PageQuery,
    RegisterTrainingRequest,
};
use internship_core_db::models::{TrackerCount, TrackerModel, TrainingModel};
use internship_core_db::repository::Page;
use internship_core_service::paging::page_request;
use internship_core_service::TrainingSummary;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::{AuthSession, IdPath, OptionalJson, QueryParams, ValidatedJson};
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TrainingBody {
    pub training: TrainingModel,
}

#[derive(Debug, Serialize)]
pub struct TrackerBody {
    pub tracker: TrackerModel,
}

#[derive(Debug, Serialize)]
pub struct StatsBody {
    pub counts: Vec<TrackerCount>,
}

#[derive(Debug, Serialize)]
pub struct SweepBody {
    pub promoted: usize,
    pub trackers: Vec<TrackerModel>,
}

/// POST /trainings
pub async fn register_training(
    State(state): State<AppState>,
    auth: AuthSession,
    ValidatedJson(request): ValidatedJson<RegisterTrainingRequest>,
) -> ApiResult<Success<TrainingBody>> {
    let training = state
        .evaluations
        .register_training(&auth.ctx, &auth.session, request)
        .await?;
    Ok(Success::new(TrainingBody { training }))
}

/// GET /trainings/{id}/evaluations
pub async fn training_summary(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(training_id): IdPath,
) -> ApiResult<Success<TrainingSummary>> {
    let summary = state
        .evaluations
        .summary(&auth.ctx, &auth.session, training_id)
        .await?;
    Ok(Success::new(summary))
}

/// POST /evaluations/{id}/assign
pub async fn assign(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(tracker_id): IdPath,
    ValidatedJson(request): ValidatedJson<AssignEvaluatorRequest>,
) -> ApiResult<Success<TrackerBody>> {
    let tracker = state
        .evaluations
        .assign(&auth.ctx, &auth.session, tracker_id, request.evaluator_id, request.due_at)
        .await?;
    Ok(Success::new(TrackerBody { tracker }))
}

/// POST /evaluations/{id}/complete
pub async fn complete(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(tracker_id): IdPath,
    OptionalJson(request): OptionalJson<CompleteEvaluationRequest>,
) -> ApiResult<Success<TrackerBody>> {
    let tracker = state
        .evaluations
        .complete(&auth.ctx, &auth.session, tracker_id, request.remarks)
        .await?;
    Ok(Success::new(TrackerBody { tracker }))
}

/// GET /me/evaluations
pub async fn my_evaluations(
    State(state): State<AppState>,
    auth: AuthSession,
    QueryParams(query): QueryParams<PageQuery>,
) -> ApiResult<Success<Page<TrackerModel>>> {
    let page = page_request(query.page, query.page_size);
    let trackers = state
        .evaluations
        .assignments(&auth.ctx, &auth.session, page)
        .await?;
    Ok(Success::new(trackers))
}

/// GET /evaluations/overdue
pub async fn overdue(
    State(state): State<AppState>,
    auth: AuthSession,
    QueryParams(query): QueryParams<PageQuery>,
) -> ApiResult<Success<Page<TrackerModel>>> {
    let page = page_request(query.page, query.page_size);
    let trackers = state
        .evaluations
        .list_overdue(&auth.ctx, &auth.session, page)
        .await?;
    Ok(Success::new(trackers))
}

/// GET /evaluations?kind=&status=&page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthSession,
    QueryParams(query): QueryParams<EvaluationListQuery>,
) -> ApiResult<Success<Page<TrackerModel>>> {
    let trackers = state
        .evaluations
        .list_by_kind(&auth.ctx, &auth.session, &query)
        .await?;
    Ok(Success::new(trackers))
}

/// GET /evaluations/stats
pub async fn stats(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Success<StatsBody>> {
    let counts = state.evaluations.stats(&auth.ctx, &auth.session).await?;
    Ok(Success::new(StatsBody { counts }))
}

/// POST /evaluations/sweep
pub async fn sweep(State(state): State<AppState>, auth: AuthSession) -> ApiResult<Success<SweepBody>> {
    let trackers = state
        .evaluations
        .sweep_overdue(&auth.ctx, &auth.session)
        .await?;
    Ok(Success::new(SweepBody {
        promoted: trackers.len(),
        trackers,
    }))
}
