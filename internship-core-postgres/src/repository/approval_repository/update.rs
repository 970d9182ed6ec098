use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::approval::ApprovalModel;

use super::repo_impl::{ApprovalRepositoryImpl, APPROVAL_COLUMNS};
use crate::utils::TryFromRow;

impl ApprovalRepositoryImpl {
    pub(super) async fn update_impl(&self, item: &ApprovalModel) -> StoreResult<ApprovalModel> {
        let query = format!(
            r#"
            WITH a AS (
                UPDATE internship_approvals SET
                    status = $2, advisor_id = $3, committee_id = $4,
                    advisor_decided_at = $5, committee_decided_at = $6, withdrawn_at = $7,
                    advisor_reason = $8, committee_reason = $9, withdraw_reason = $10,
                    last_actor_type = $11, last_actor_id = $12, updated_at = $13,
                    version = version + 1
                WHERE id = $1 AND version = $14
                RETURNING *
            )
            SELECT {APPROVAL_COLUMNS} FROM a
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.id)
                .bind(item.status)
                .bind(item.advisor_id)
                .bind(item.committee_id)
                .bind(item.advisor_decided_at)
                .bind(item.committee_decided_at)
                .bind(item.withdrawn_at)
                .bind(item.advisor_reason.as_deref())
                .bind(item.committee_reason.as_deref())
                .bind(item.withdraw_reason.as_deref())
                .bind(item.last_actor.map(|actor| actor.kind))
                .bind(item.last_actor.map(|actor| actor.id))
                .bind(item.updated_at)
                .bind(item.version)
                .fetch_optional(&mut **transaction)
                .await?
        };

        match row {
            Some(row) => ApprovalModel::try_from_row(&row),
            None => Err(StoreError::conflict("approval", item.id)),
        }
    }
}
