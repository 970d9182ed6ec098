use async_trait::async_trait;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::training::{NewTraining, TrainingModel};
use internship_core_db::repository::training::TrainingRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_json, to_json, TryFromRow};

const TRAINING_COLUMNS: &str = "id, student_enroll_id, company_id, start_date, end_date, \
     coordinator, supervisor, position, department, job_description, document_language, created_at";

pub struct TrainingRepositoryImpl {
    pub executor: Executor,
}

impl TrainingRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    async fn find_one(&self, column: &str, value: i64) -> StoreResult<Option<TrainingModel>> {
        let query = format!("SELECT {TRAINING_COLUMNS} FROM student_trainings WHERE {column} = $1");
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(value)
                .fetch_optional(&mut **transaction)
                .await?
        };
        row.as_ref().map(TrainingModel::try_from_row).transpose()
    }
}

impl TryFromRow<PgRow> for TrainingModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(TrainingModel {
            id: row.try_get("id")?,
            student_enroll_id: row.try_get("student_enroll_id")?,
            company_id: row.try_get("company_id")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            coordinator: get_json(row, "coordinator")?,
            supervisor: get_json(row, "supervisor")?,
            position: row.try_get("position")?,
            department: row.try_get("department")?,
            job_description: row.try_get("job_description")?,
            document_language: row.try_get("document_language")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl TrainingRepository for TrainingRepositoryImpl {
    async fn create(&self, item: NewTraining) -> StoreResult<TrainingModel> {
        let query = format!(
            r#"
            INSERT INTO student_trainings (student_enroll_id, company_id, start_date, end_date,
                coordinator, supervisor, position, department, job_description, document_language)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TRAINING_COLUMNS}
            "#
        );
        let coordinator = to_json(&item.coordinator)?;
        let supervisor = to_json(&item.supervisor)?;
        let row = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(item.student_enroll_id)
                .bind(item.company_id)
                .bind(item.start_date)
                .bind(item.end_date)
                .bind(coordinator)
                .bind(supervisor)
                .bind(&item.position)
                .bind(item.department.as_deref())
                .bind(item.job_description.as_deref())
                .bind(item.document_language)
                .fetch_one(&mut **transaction)
                .await?
        };
        TrainingModel::try_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrainingModel>> {
        self.find_one("id", id).await
    }

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<TrainingModel>> {
        self.find_one("student_enroll_id", student_enroll_id).await
    }
}
