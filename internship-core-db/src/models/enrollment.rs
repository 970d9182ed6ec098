use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row of `student_enrolls`: a student enrolled in an internship course with an advisor of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentModel {
    pub id: i64,
    pub student_id: i64,
    pub advisor_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEnrollment {
    pub student_id: i64,
    pub advisor_id: Option<i64>,
}
