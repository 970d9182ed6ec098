use chrono::{DateTime, Utc};
use internship_core_api::PrincipalRef;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// # Documentation
/// - Append-only row of `security_logs`.
/// - Entries are never updated; the retention sweep deletes them by age only.
/// - `actor` is empty when the request could not be tied to a principal (e.g. unknown login).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntryModel {
    pub id: Uuid,
    pub actor: Option<PrincipalRef>,
    pub action: String,
    pub subject_kind: String,
    pub subject_id: String,
    pub source_address: Option<String>,
    pub user_agent: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
