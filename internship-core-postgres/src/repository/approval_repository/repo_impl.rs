use async_trait::async_trait;
use internship_core_db::error::StoreResult;
use internship_core_db::models::approval::{
    ApprovalFilter, ApprovalModel, ApprovalTransitionModel, NewApproval, NewApprovalTransition,
};
use internship_core_db::repository::approval::ApprovalRepository;
use internship_core_db::repository::pagination::{Page, PageRequest};
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_optional_principal, get_principal, TryFromRow};

pub(super) const APPROVAL_COLUMNS: &str = "a.id, a.student_enroll_id, a.student_id, a.status, \
     a.advisor_id, a.committee_id, a.registered_at, a.advisor_decided_at, a.committee_decided_at, \
     a.withdrawn_at, a.advisor_reason, a.committee_reason, a.withdraw_reason, \
     a.last_actor_type, a.last_actor_id, a.version, a.created_at, a.updated_at";

pub struct ApprovalRepositoryImpl {
    pub executor: Executor,
}

impl ApprovalRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for ApprovalModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(ApprovalModel {
            id: row.try_get("id")?,
            student_enroll_id: row.try_get("student_enroll_id")?,
            student_id: row.try_get("student_id")?,
            status: row.try_get("status")?,
            advisor_id: row.try_get("advisor_id")?,
            committee_id: row.try_get("committee_id")?,
            registered_at: row.try_get("registered_at")?,
            advisor_decided_at: row.try_get("advisor_decided_at")?,
            committee_decided_at: row.try_get("committee_decided_at")?,
            withdrawn_at: row.try_get("withdrawn_at")?,
            advisor_reason: row.try_get("advisor_reason")?,
            committee_reason: row.try_get("committee_reason")?,
            withdraw_reason: row.try_get("withdraw_reason")?,
            last_actor: get_optional_principal(row, "last_actor_type", "last_actor_id")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFromRow<PgRow> for ApprovalTransitionModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(ApprovalTransitionModel {
            id: row.try_get("id")?,
            approval_id: row.try_get("approval_id")?,
            action: row.try_get("action")?,
            from_status: row.try_get("from_status")?,
            to_status: row.try_get("to_status")?,
            actor: get_principal(row, "actor_type", "actor_id")?,
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl ApprovalRepository for ApprovalRepositoryImpl {
    async fn create(&self, item: NewApproval) -> StoreResult<ApprovalModel> {
        Self::create_impl(self, item).await
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<ApprovalModel>> {
        Self::find_by_id_impl(self, id).await
    }

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<ApprovalModel>> {
        Self::find_by_enrollment_impl(self, student_enroll_id).await
    }

    async fn update(&self, item: &ApprovalModel) -> StoreResult<ApprovalModel> {
        Self::update_impl(self, item).await
    }

    async fn list(&self, filter: ApprovalFilter, page: PageRequest) -> StoreResult<Page<ApprovalModel>> {
        Self::list_impl(self, filter, page).await
    }

    async fn append_transition(
        &self,
        item: NewApprovalTransition,
    ) -> StoreResult<ApprovalTransitionModel> {
        Self::append_transition_impl(self, item).await
    }

    async fn history(&self, approval_id: i64) -> StoreResult<Vec<ApprovalTransitionModel>> {
        Self::history_impl(self, approval_id).await
    }
}
