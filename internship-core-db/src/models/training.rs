use chrono::{DateTime, NaiveDate, Utc};
use internship_core_api::{ContactBlock, DocumentLanguage};
use serde::{Deserialize, Serialize};

/// Contact block stored as JSON on the training row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
}

impl From<ContactBlock> for ContactInfo {
    fn from(block: ContactBlock) -> Self {
        Self {
            name: block.name,
            phone: block.phone,
            email: block.email,
            position: block.position,
        }
    }
}

/// # Documentation
/// - Confirmed placement of an approved enrollment at a company. At most one per enrollment.
/// - Invariant: `start_date <= end_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingModel {
    pub id: i64,
    pub student_enroll_id: i64,
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub coordinator: ContactInfo,
    pub supervisor: ContactInfo,
    pub position: String,
    pub department: Option<String>,
    pub job_description: Option<String>,
    pub document_language: DocumentLanguage,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTraining {
    pub student_enroll_id: i64,
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub coordinator: ContactInfo,
    pub supervisor: ContactInfo,
    pub position: String,
    pub department: Option<String>,
    pub job_description: Option<String>,
    pub document_language: DocumentLanguage,
}
