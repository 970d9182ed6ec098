use async_trait::async_trait;
use internship_core_api::PrincipalRef;

use crate::error::StoreResult;
use crate::models::notification::NotificationModel;

/// Notification outbox.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn enqueue(&self, item: NotificationModel) -> StoreResult<()>;

    /// Notifications addressed to `recipient`, newest first
    async fn find_by_recipient(&self, recipient: PrincipalRef) -> StoreResult<Vec<NotificationModel>>;
}
