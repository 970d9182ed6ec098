use internship_core_api::{PrincipalKind, PrincipalRef, StudentId};
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::principal::{PrincipalRecord, StudentModel};

use super::repo_impl::{record_from_row, table_of, PrincipalRepositoryImpl, STUDENT_COLUMNS, SUPER_ADMIN_COLUMNS};
use crate::utils::TryFromRow;

fn columns_of(kind: PrincipalKind) -> &'static str {
    match kind {
        PrincipalKind::Student => STUDENT_COLUMNS,
        PrincipalKind::SuperAdmin => SUPER_ADMIN_COLUMNS,
    }
}

impl PrincipalRepositoryImpl {
    pub(super) async fn find_student_by_student_id_impl(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Option<StudentModel>> {
        let query = format!("SELECT {STUDENT_COLUMNS} FROM users WHERE student_id = $1");
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(student_id.as_str())
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(StudentModel::try_from_row).transpose()
    }

    pub(super) async fn find_by_email_impl(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> StoreResult<Option<PrincipalRecord>> {
        let query = format!(
            "SELECT {} FROM {} WHERE lower(email) = lower($1) \
             ORDER BY (status = 'active') DESC, id DESC LIMIT 1",
            columns_of(kind),
            table_of(kind)
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(email)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.map(|row| record_from_row(kind, &row)).transpose()
    }

    pub(super) async fn find_by_ref_impl(
        &self,
        principal: PrincipalRef,
    ) -> StoreResult<Option<PrincipalRecord>> {
        let query = format!(
            "SELECT {} FROM {} WHERE id = $1",
            columns_of(principal.kind),
            table_of(principal.kind)
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(principal.id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.map(|row| record_from_row(principal.kind, &row)).transpose()
    }
}
