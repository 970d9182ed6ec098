use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::principal::{
    NewStudent, NewSuperAdmin, StudentModel, SuperAdminModel,
};

use super::repo_impl::{PrincipalRepositoryImpl, STUDENT_COLUMNS, SUPER_ADMIN_COLUMNS};
use crate::utils::TryFromRow;

impl PrincipalRepositoryImpl {
    pub(super) async fn create_student_impl(&self, item: NewStudent) -> StoreResult<StudentModel> {
        let query = format!(
            r#"
            INSERT INTO users (student_id, full_name, email, password_hash, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDENT_COLUMNS}
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.student_id.as_str())
                .bind(&item.full_name)
                .bind(&item.email)
                .bind(&item.password_hash)
                .bind(item.status)
                .fetch_one(&mut **transaction)
                .await?
        };
        StudentModel::try_from_row(&row)
    }

    pub(super) async fn create_super_admin_impl(
        &self,
        item: NewSuperAdmin,
    ) -> StoreResult<SuperAdminModel> {
        let query = format!(
            r#"
            INSERT INTO super_admins (full_name, email, password_hash, status, abilities)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUPER_ADMIN_COLUMNS}
            "#
        );
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(&item.full_name)
                .bind(&item.email)
                .bind(&item.password_hash)
                .bind(item.status)
                .bind(&item.abilities)
                .fetch_one(&mut **transaction)
                .await?
        };
        SuperAdminModel::try_from_row(&row)
    }
}
