use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::domain::evaluation::{DocumentLanguage, TrackerKind, TrackerStatus};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignEvaluatorRequest {
    #[validate(range(min = 1))]
    pub evaluator_id: i64,
    pub due_at: Option<DateTime<Utc>>,
}

/// Body of a completion. Without `remarks` the stored remarks are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CompleteEvaluationRequest {
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationListQuery {
    pub kind: Option<TrackerKind>,
    pub status: Option<TrackerStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactBlock {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(max = 50))]
    pub phone: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(max = 255))]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_training_period"))]
pub struct RegisterTrainingRequest {
    #[validate(range(min = 1))]
    pub student_enroll_id: i64,
    #[validate(range(min = 1))]
    pub company_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[validate(nested)]
    pub coordinator: ContactBlock,
    #[validate(nested)]
    pub supervisor: ContactBlock,
    #[validate(length(min = 1, max = 255))]
    pub position: String,
    #[validate(length(max = 255))]
    pub department: Option<String>,
    #[validate(length(max = 5000))]
    pub job_description: Option<String>,
    pub document_language: DocumentLanguage,
}

fn validate_training_period(request: &RegisterTrainingRequest) -> Result<(), ValidationError> {
    if request.start_date > request.end_date {
        let mut error = ValidationError::new("period");
        error.message = Some("start_date must not be after end_date".into());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::requests::validated;

    fn contact(name: &str) -> ContactBlock {
        ContactBlock {
            name: name.to_string(),
            phone: None,
            email: Some("hr@company.example".to_string()),
            position: None,
        }
    }

    fn training(start: NaiveDate, end: NaiveDate) -> RegisterTrainingRequest {
        RegisterTrainingRequest {
            student_enroll_id: 1,
            company_id: 3,
            start_date: start,
            end_date: end,
            coordinator: contact("Coordinator"),
            supervisor: contact("Supervisor"),
            position: "Backend intern".to_string(),
            department: None,
            job_description: None,
            document_language: DocumentLanguage::En,
        }
    }

    #[test]
    fn test_reversed_period_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert!(matches!(
            validated(training(start, end)),
            Err(CoreError::ValidationFailed(_))
        ));
        assert!(validated(training(end, start)).is_ok());
        assert!(validated(training(start, start)).is_ok());
    }

    #[test]
    fn test_nested_contact_errors_carry_path() {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let mut request = training(day, day);
        request.supervisor = contact("");
        match validated(request) {
            Err(CoreError::ValidationFailed(fields)) => {
                assert!(fields.iter().any(|f| f.field == "supervisor.name"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }
}
