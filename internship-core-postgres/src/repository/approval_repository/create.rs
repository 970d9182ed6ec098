use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::approval::{ApprovalModel, NewApproval};

use super::repo_impl::{ApprovalRepositoryImpl, APPROVAL_COLUMNS};
use crate::utils::TryFromRow;

impl ApprovalRepositoryImpl {
    pub(super) async fn create_impl(&self, item: NewApproval) -> StoreResult<ApprovalModel> {
        let query = format!(
            r#"
            WITH a AS (
                INSERT INTO internship_approvals (student_enroll_id, student_id, status, advisor_id,
                    committee_id, registered_at, version, created_at, updated_at)
                VALUES ($1, $2, 'registered', $3, $4, $5, 1, $5, $5)
                RETURNING *
            )
            SELECT {APPROVAL_COLUMNS} FROM a
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.student_enroll_id)
                .bind(item.student_id)
                .bind(item.advisor_id)
                .bind(item.committee_id)
                .bind(item.registered_at)
                .fetch_one(&mut **transaction)
                .await?
        };
        ApprovalModel::try_from_row(&row)
    }
}
