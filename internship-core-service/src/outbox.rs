use std::sync::Arc;

use internship_core_api::{CoreResult, NotificationCategory, PrincipalRef};
use internship_core_db::models::notification::NotificationModel;
use internship_core_db::repository::UnitOfWork;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::clock::Clock;

/// Carries a single-use bearer to its owner, out of band.
///
/// Notification rows only name the token id; the bearer itself is handed
/// here once the issuing transaction has committed.
pub trait Courier: Send + Sync {
    fn deliver(&self, recipient: PrincipalRef, category: NotificationCategory, token_id: &str, bearer: &str);
}

/// Drops every bearer. Used until a mail transport is wired in.
pub struct NullCourier;

impl Courier for NullCourier {
    fn deliver(&self, recipient: PrincipalRef, category: NotificationCategory, token_id: &str, _bearer: &str) {
        warn!(%recipient, %category, token_id, "No courier configured, bearer dropped");
    }
}

/// Writes notification records next to the change that caused them. Delivery is
/// somebody else's job.
#[derive(Clone)]
pub struct Outbox {
    clock: Arc<dyn Clock>,
}

impl Outbox {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub async fn enqueue(
        &self,
        uow: &dyn UnitOfWork,
        recipient: PrincipalRef,
        category: NotificationCategory,
        payload: Value,
    ) -> CoreResult<()> {
        debug!(%recipient, %category, "Queueing notification");
        uow.notifications()
            .enqueue(NotificationModel {
                id: Uuid::new_v4(),
                recipient,
                category: category.as_str().to_string(),
                payload,
                created_at: self.clock.now(),
                delivered_at: None,
            })
            .await?;
        Ok(())
    }
}
