use async_trait::async_trait;
use internship_core_api::PrincipalRef;
use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::notification::NotificationModel;
use internship_core_db::repository::notification::NotificationRepository;
use sqlx::{postgres::PgRow, Row};

use crate::executor::Executor;
use crate::utils::{get_principal, TryFromRow};

pub struct NotificationRepositoryImpl {
    pub executor: Executor,
}

impl NotificationRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for NotificationModel {
    fn try_from_row(row: &PgRow) -> StoreResult<Self> {
        Ok(NotificationModel {
            id: row.try_get("id")?,
            recipient: get_principal(row, "recipient_type", "recipient_id")?,
            category: row.try_get("category")?,
            payload: row.try_get("payload")?,
            created_at: row.try_get("created_at")?,
            delivered_at: row.try_get("delivered_at")?,
        })
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn enqueue(&self, item: NotificationModel) -> StoreResult<()> {
        let mut tx = self.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_type, recipient_id, category, payload, created_at, delivered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.recipient.kind)
        .bind(item.recipient.id)
        .bind(&item.category)
        .bind(&item.payload)
        .bind(item.created_at)
        .bind(item.delivered_at)
        .execute(&mut **transaction)
        .await?;
        Ok(())
    }

    async fn find_by_recipient(&self, recipient: PrincipalRef) -> StoreResult<Vec<NotificationModel>> {
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(
                r#"
                SELECT id, recipient_type, recipient_id, category, payload, created_at, delivered_at
                FROM notifications
                WHERE recipient_type = $1 AND recipient_id = $2
                ORDER BY created_at DESC
                "#,
            )
            .bind(recipient.kind)
            .bind(recipient.id)
            .fetch_all(&mut **transaction)
            .await?
        };
        rows.iter().map(NotificationModel::try_from_row).collect()
    }
}
