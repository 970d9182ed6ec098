use internship_core_db::error::{StoreError, StoreResult};
use internship_core_db::models::tracker::{NewTracker, TrackerModel};

use super::repo_impl::{TrackerRepositoryImpl, TRACKER_COLUMNS};
use crate::utils::TryFromRow;

impl TrackerRepositoryImpl {
    pub(super) async fn create_batch_impl(&self, items: Vec<NewTracker>) -> StoreResult<Vec<TrackerModel>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let training_ids: Vec<i64> = items.iter().map(|item| item.training_id).collect();
        let kinds: Vec<&str> = items.iter().map(|item| item.kind.as_str()).collect();

        let query = format!(
            r#"
            INSERT INTO evaluation_status_trackers (training_id, kind, status, version)
            SELECT training_id, kind::tracker_kind, 'pending', 1
            FROM UNNEST($1::BIGINT[], $2::TEXT[]) AS t(training_id, kind)
            RETURNING {TRACKER_COLUMNS}
            "#
        );
        let rows = {
            let mut tx = self.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or(StoreError::TransactionConsumed)?;
            sqlx::query(&query)
                .bind(training_ids)
                .bind(kinds)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut trackers = rows
            .iter()
            .map(TrackerModel::try_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        trackers.sort_by_key(|tracker| (tracker.training_id, tracker.kind));
        Ok(trackers)
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_utils::seed_training;
    use crate::test_helper::setup_test_context;
    use internship_core_api::{TrackerKind, TrackerStatus};
    use internship_core_db::error::StoreError;
    use internship_core_db::models::tracker::NewTracker;
    use internship_core_db::repository::Store;
    use serial_test::serial;

    #[tokio::test]
    #[serial]
    #[ignore = "requires DATABASE_URL"]
    async fn test_one_tracker_per_kind() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let uow = ctx.store.begin().await?;
        let training = seed_training(uow.as_ref(), "65130070").await?;
        let batch: Vec<NewTracker> = TrackerKind::ALL
            .iter()
            .map(|kind| NewTracker { training_id: training.id, kind: *kind })
            .collect();

        let created = uow.trackers().create_batch(batch).await?;
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|t| t.status == TrackerStatus::Pending && t.evaluator.is_none()));

        let err = uow
            .trackers()
            .create_batch(vec![NewTracker { training_id: training.id, kind: TrackerKind::StudentCompany }])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
        Ok(())
    }
}
