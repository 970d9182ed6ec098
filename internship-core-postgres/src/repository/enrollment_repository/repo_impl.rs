use async_trait::async_trait;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::enrollment::{EnrollmentModel, NewEnrollment};
use internship_core_db::repository::enrollment::EnrollmentRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::TryFromRow;

pub struct EnrollmentRepositoryImpl {
    pub executor: Executor,
}

impl EnrollmentRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for EnrollmentModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(EnrollmentModel {
            id: row.try_get("id")?,
            student_id: row.try_get("student_id")?,
            advisor_id: row.try_get("advisor_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl EnrollmentRepository for EnrollmentRepositoryImpl {
    async fn create(&self, item: NewEnrollment) -> StoreResult<EnrollmentModel> {
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(
                r#"
                INSERT INTO student_enrolls (student_id, advisor_id)
                VALUES ($1, $2)
                RETURNING id, student_id, advisor_id, created_at
                "#,
            )
            .bind(item.student_id)
            .bind(item.advisor_id)
            .fetch_one(&mut **transaction)
            .await?
        };
        EnrollmentModel::try_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<EnrollmentModel>> {
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query("SELECT id, student_id, advisor_id, created_at FROM student_enrolls WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(EnrollmentModel::try_from_row).transpose()
    }
}
