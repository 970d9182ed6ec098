use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::audit::AuditEntryModel;
use internship_core_db::repository::audit::AuditRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_optional_principal, TryFromRow};

pub struct AuditRepositoryImpl {
    pub executor: Executor,
}

impl AuditRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for AuditEntryModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(AuditEntryModel {
            id: row.try_get("id")?,
            actor: get_optional_principal(row, "actor_type", "actor_id")?,
            action: row.try_get("action")?,
            subject_kind: row.try_get("subject_type")?,
            subject_id: row.try_get("subject_id")?,
            source_address: row.try_get("ip_address")?,
            user_agent: row.try_get("user_agent")?,
            metadata: row.try_get("metadata")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AuditRepository for AuditRepositoryImpl {
    async fn append(&self, item: AuditEntryModel) -> StoreResult<()> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        sqlx::query(
            r#"
            INSERT INTO security_logs (id, actor_type, actor_id, action, subject_type, subject_id,
                ip_address, user_agent, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(item.id)
        .bind(item.actor.map(|actor| actor.kind))
        .bind(item.actor.map(|actor| actor.id))
        .bind(&item.action)
        .bind(&item.subject_kind)
        .bind(&item.subject_id)
        .bind(item.source_address.as_deref())
        .bind(item.user_agent.as_deref())
        .bind(&item.metadata)
        .bind(item.created_at)
        .execute(&mut **transaction)
        .await?;
        Ok(())
    }

    async fn find_by_subject(
        &self,
        subject_kind: &str,
        subject_id: &str,
    ) -> StoreResult<Vec<AuditEntryModel>> {
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(
                r#"
                SELECT id, actor_type, actor_id, action, subject_type, subject_id,
                       ip_address, user_agent, metadata, created_at
                FROM security_logs
                WHERE subject_type = $1 AND subject_id = $2
                ORDER BY created_at ASC, id ASC
                "#,
            )
            .bind(subject_kind)
            .bind(subject_id)
            .fetch_all(&mut **transaction)
            .await?
        };
        rows.iter().map(AuditEntryModel::try_from_row).collect()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        let result = sqlx::query("DELETE FROM security_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(&mut **transaction)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_helper::setup_test_context;
    use chrono::{Duration, Utc};
    use internship_core_api::PrincipalRef;
    use internship_core_db::models::audit::AuditEntryModel;
    use internship_core_db::repository::Store;
    use serial_test::serial;
    use uuid::Uuid;

    fn entry(subject_id: &str, age: Duration) -> AuditEntryModel {
        AuditEntryModel {
            id: Uuid::new_v4(),
            actor: Some(PrincipalRef::super_admin(1)),
            action: "login_success".to_string(),
            subject_kind: "principal".to_string(),
            subject_id: subject_id.to_string(),
            source_address: Some("10.0.0.1".to_string()),
            user_agent: None,
            metadata: serde_json::json!({ "device": "cli" }),
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    #[serial]
    #[ignore = "requires DATABASE_URL"]
    async fn test_retention_deletes_by_age_only() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let uow = ctx.store.begin().await?;
        let subject = Uuid::new_v4().to_string();
        uow.audit().append(entry(&subject, Duration::days(400))).await?;
        uow.audit().append(entry(&subject, Duration::zero())).await?;

        let deleted = uow
            .audit()
            .delete_older_than(Utc::now() - Duration::days(365))
            .await?;
        assert!(deleted >= 1);

        let remaining = uow.audit().find_by_subject("principal", &subject).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].metadata["device"], "cli");
        Ok(())
    }
}
