use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::approval::{ApprovalFilter, ApprovalModel};
use internship_core_db::repository::pagination::{Page, PageRequest};
use sqlx::Row;

use super::repo_impl::{ApprovalRepositoryImpl, APPROVAL_COLUMNS};
use crate::utils::TryFromRow;

/// Shared FROM/WHERE clause. Unset filters are bound as NULL and match everything.
const LIST_PREDICATE: &str = r#"
    FROM internship_approvals a
    JOIN student_enrolls e ON e.id = a.student_enroll_id
    WHERE ($1::BIGINT IS NULL OR e.advisor_id = $1)
      AND ($2::BIGINT IS NULL OR a.committee_id = $2)
      AND ($3::BIGINT IS NULL OR a.student_id = $3)
      AND ($4::approval_status IS NULL OR a.status = $4)
"#;

impl ApprovalRepositoryImpl {
    pub(super) async fn list_impl(
        &self,
        filter: ApprovalFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ApprovalModel>> {
        let count_query = format!("SELECT COUNT(*) AS total {LIST_PREDICATE}");
        let select_query = format!(
            "SELECT {APPROVAL_COLUMNS} {LIST_PREDICATE} ORDER BY a.created_at DESC, a.id DESC LIMIT $5 OFFSET $6"
        );

        let (total, rows) = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;

            let total: i64 = sqlx::query(&count_query)
                .bind(filter.advisor_id)
                .bind(filter.committee_id)
                .bind(filter.student_id)
                .bind(filter.status)
                .fetch_one(&mut **transaction)
                .await?
                .try_get("total")?;

            let rows = sqlx::query(&select_query)
                .bind(filter.advisor_id)
                .bind(filter.committee_id)
                .bind(filter.student_id)
                .bind(filter.status)
                .bind(page.limit as i64)
                .bind(page.offset as i64)
                .fetch_all(&mut **transaction)
                .await?;
            (total, rows)
        };

        let items = rows
            .iter()
            .map(ApprovalModel::try_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }
}
