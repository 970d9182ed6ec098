use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outbox row. Written in the same transaction as the change that caused it; delivery
/// happens elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationModel {
    pub id: Uuid,
    pub recipient: PrincipalRef,
    pub category: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}
