use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::approval::ApprovalModel;

use super::repo_impl::{ApprovalRepositoryImpl, APPROVAL_COLUMNS};
use crate::utils::TryFromRow;

impl ApprovalRepositoryImpl {
    pub(super) async fn find_by_id_impl(&self, id: i64) -> StoreResult<Option<ApprovalModel>> {
        let query = format!("SELECT {APPROVAL_COLUMNS} FROM internship_approvals a WHERE a.id = $1");
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(ApprovalModel::try_from_row).transpose()
    }

    pub(super) async fn find_by_enrollment_impl(
        &self,
        student_enroll_id: i64,
    ) -> StoreResult<Option<ApprovalModel>> {
        let query = format!(
            "SELECT {APPROVAL_COLUMNS} FROM internship_approvals a WHERE a.student_enroll_id = $1"
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(student_enroll_id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(ApprovalModel::try_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use internship_core_db::repository::Store;
    use serial_test::serial;
    use std::error::Error;

    use crate::repository::test_utils::seed_approval;
    use crate::test_helper::setup_test_context;

    #[tokio::test]
    #[serial]
    #[ignore = "requires DATABASE_URL"]
    async fn test_find_by_enrollment() -> Result<(), Box<dyn Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let uow = ctx.store.begin().await?;
        let approval = seed_approval(uow.as_ref(), "65130050").await?;

        let found = uow.approvals().find_by_enrollment(approval.student_enroll_id).await?;
        assert_eq!(found.map(|a| a.id), Some(approval.id));
        assert!(uow
            .approvals()
            .find_by_enrollment(approval.student_enroll_id + 1000)
            .await?
            .is_none());
        Ok(())
    }
}
