use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::models::audit::AuditEntryModel;

/// Append-only security log.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn append(&self, item: AuditEntryModel) -> StoreResult<()>;

    /// Entries about one subject, oldest first. Not used on the request path.
    async fn find_by_subject(
        &self,
        subject_kind: &str,
        subject_id: &str,
    ) -> StoreResult<Vec<AuditEntryModel>>;

    /// Retention: delete entries created before `cutoff`
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}
