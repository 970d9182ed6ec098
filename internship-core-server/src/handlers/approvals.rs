use axum::extract::State;
use internship_core_api::{
    ApprovalAction, ApprovalListQuery, AssignCommitteeRequest, DecisionRequest,
    RegisterApprovalRequest,
};
use internship_core_db::models::{ApprovalModel, ApprovalTransitionModel};
use internship_core_db::repository::Page;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::{AuthSession, IdPath, OptionalJson, QueryParams, ValidatedJson};
use crate::response::Success;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ApprovalBody {
    pub approval: ApprovalModel,
}

#[derive(Debug, Serialize)]
pub struct HistoryBody {
    pub transitions: Vec<ApprovalTransitionModel>,
}

/// GET /approvals?role=&status=&page=&page_size=
pub async fn list(
    State(state): State<AppState>,
    auth: AuthSession,
    QueryParams(query): QueryParams<ApprovalListQuery>,
) -> ApiResult<Success<Page<ApprovalModel>>> {
    let page = state.approvals.list(&auth.ctx, &auth.session, &query).await?;
    Ok(Success::new(page))
}

/// GET /approvals/{id}
pub async fn get(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
) -> ApiResult<Success<ApprovalBody>> {
    let approval = state.approvals.get(&auth.ctx, &auth.session, id).await?;
    Ok(Success::new(ApprovalBody { approval }))
}

/// GET /approvals/{id}/history
pub async fn history(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
) -> ApiResult<Success<HistoryBody>> {
    let transitions = state.approvals.history(&auth.ctx, &auth.session, id).await?;
    Ok(Success::new(HistoryBody { transitions }))
}

/// POST /approvals
pub async fn register(
    State(state): State<AppState>,
    auth: AuthSession,
    ValidatedJson(request): ValidatedJson<RegisterApprovalRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    let approval = state
        .approvals
        .register(&auth.ctx, &auth.session, request.student_enroll_id)
        .await?;
    Ok(Success::new(ApprovalBody { approval }))
}

/// POST /approvals/{id}/committee
pub async fn assign_committee(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    ValidatedJson(request): ValidatedJson<AssignCommitteeRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    let approval = state
        .approvals
        .assign_committee(&auth.ctx, &auth.session, id, request.committee_id)
        .await?;
    Ok(Success::new(ApprovalBody { approval }))
}

async fn decide(
    state: AppState,
    auth: AuthSession,
    id: i64,
    action: ApprovalAction,
    request: DecisionRequest,
) -> ApiResult<Success<ApprovalBody>> {
    let approval = state
        .approvals
        .transition(&auth.ctx, &auth.session, id, action, request.reason)
        .await?;
    Ok(Success::new(ApprovalBody { approval }))
}

/// POST /approvals/{id}/advisor-approve
pub async fn advisor_approve(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    decide(state, auth, id, ApprovalAction::AdvisorApprove, request).await
}

/// POST /approvals/{id}/advisor-reject
pub async fn advisor_reject(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    decide(state, auth, id, ApprovalAction::AdvisorReject, request).await
}

/// POST /approvals/{id}/committee-approve
pub async fn committee_approve(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    decide(state, auth, id, ApprovalAction::CommitteeApprove, request).await
}

/// POST /approvals/{id}/committee-reject
pub async fn committee_reject(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    decide(state, auth, id, ApprovalAction::CommitteeReject, request).await
}

/// POST /approvals/{id}/withdraw
pub async fn withdraw(
    State(state): State<AppState>,
    auth: AuthSession,
    IdPath(id): IdPath,
    OptionalJson(request): OptionalJson<DecisionRequest>,
) -> ApiResult<Success<ApprovalBody>> {
    decide(state, auth, id, ApprovalAction::Withdraw, request).await
}
