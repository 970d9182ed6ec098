use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::approval::{ApprovalTransitionModel, NewApprovalTransition};

use super::repo_impl::ApprovalRepositoryImpl;
use crate::utils::TryFromRow;

const TRANSITION_COLUMNS: &str =
    "id, approval_id, action, from_status, to_status, actor_type, actor_id, reason, created_at";

impl ApprovalRepositoryImpl {
    pub(super) async fn append_transition_impl(
        &self,
        item: NewApprovalTransition,
    ) -> StoreResult<ApprovalTransitionModel> {
        let query = format!(
            r#"
            INSERT INTO internship_approval_transitions
                (approval_id, action, from_status, to_status, actor_type, actor_id, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TRANSITION_COLUMNS}
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.approval_id)
                .bind(item.action)
                .bind(item.from_status)
                .bind(item.to_status)
                .bind(item.actor.kind)
                .bind(item.actor.id)
                .bind(item.reason.as_deref())
                .bind(item.created_at)
                .fetch_one(&mut **transaction)
                .await?
        };
        ApprovalTransitionModel::try_from_row(&row)
    }

    pub(super) async fn history_impl(&self, approval_id: i64) -> StoreResult<Vec<ApprovalTransitionModel>> {
        let query = format!(
            "SELECT {TRANSITION_COLUMNS} FROM internship_approval_transitions \
             WHERE approval_id = $1 ORDER BY id ASC"
        );
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(approval_id)
                .fetch_all(&mut **transaction)
                .await?
        };
        rows.iter().map(ApprovalTransitionModel::try_from_row).collect()
    }
}
