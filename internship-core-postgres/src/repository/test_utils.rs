use chrono::{DateTime, Duration, NaiveDate, Utc};
use internship_core_api::{
    DocumentLanguage, PrincipalRef, PrincipalStatus, TokenPurpose, TrackerKind, ABILITY_ALL,
};
use internship_core_db::error::StoreResult;
use internship_core_db::models::approval::{ApprovalModel, NewApproval};
use internship_core_db::models::enrollment::{EnrollmentModel, NewEnrollment};
use internship_core_db::models::principal::{NewStudent, NewSuperAdmin, SuperAdminModel};
use internship_core_db::models::token::TokenModel;
use internship_core_db::models::tracker::{NewTracker, TrackerModel};
use internship_core_db::models::training::{ContactInfo, NewTraining, TrainingModel};
use internship_core_db::repository::UnitOfWork;

pub fn new_student(student_id: &str, email: &str) -> NewStudent {
    NewStudent {
        student_id: student_id.parse().unwrap(),
        full_name: format!("Student {student_id}"),
        email: email.to_string(),
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderplace".to_string(),
        status: PrincipalStatus::Active,
    }
}

pub fn new_super_admin(email: &str) -> NewSuperAdmin {
    NewSuperAdmin {
        full_name: "Advisor".to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$placeholderplaceholderplaceholderplaceholderplace".to_string(),
        status: PrincipalStatus::Active,
        abilities: vec![ABILITY_ALL.to_string()],
    }
}

pub fn new_token(token_id: &str, principal: PrincipalRef, now: DateTime<Utc>) -> TokenModel {
    TokenModel {
        token_id: token_id.parse().unwrap(),
        // Same width as a hex digest.
        token_hash: format!("{token_id}{token_id}"),
        principal,
        purpose: TokenPurpose::Access,
        abilities: vec!["*".to_string()],
        device: Some("test".to_string()),
        issued_at: now,
        expires_at: now + Duration::hours(1),
        last_used_at: None,
        revoked: false,
    }
}

pub fn new_training(student_enroll_id: i64) -> NewTraining {
    let contact = |name: &str| ContactInfo {
        name: name.to_string(),
        phone: Some("021234567".to_string()),
        email: None,
        position: None,
    };
    NewTraining {
        student_enroll_id,
        company_id: 7,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 8, 31).unwrap(),
        coordinator: contact("Coordinator"),
        supervisor: contact("Supervisor"),
        position: "Backend intern".to_string(),
        department: Some("Platform".to_string()),
        job_description: None,
        document_language: DocumentLanguage::En,
    }
}

/// Student, advisor and the enrollment tying them together.
pub async fn seed_enrollment(
    uow: &dyn UnitOfWork,
    student_id: &str,
) -> StoreResult<(EnrollmentModel, SuperAdminModel)> {
    let student = uow
        .principals()
        .create_student(new_student(student_id, &format!("{student_id}@student.x.edu")))
        .await?;
    let advisor = uow
        .principals()
        .create_super_admin(new_super_admin(&format!("advisor-{student_id}@x.edu")))
        .await?;
    let enrollment = uow
        .enrollments()
        .create(NewEnrollment {
            student_id: student.id,
            advisor_id: Some(advisor.id),
        })
        .await?;
    Ok((enrollment, advisor))
}

pub async fn seed_approval(uow: &dyn UnitOfWork, student_id: &str) -> StoreResult<ApprovalModel> {
    let (enrollment, advisor) = seed_enrollment(uow, student_id).await?;
    uow.approvals()
        .create(NewApproval {
            student_enroll_id: enrollment.id,
            student_id: enrollment.student_id,
            advisor_id: Some(advisor.id),
            committee_id: None,
            registered_at: Utc::now(),
        })
        .await
}

pub async fn seed_training(uow: &dyn UnitOfWork, student_id: &str) -> StoreResult<TrainingModel> {
    let (enrollment, _) = seed_enrollment(uow, student_id).await?;
    uow.trainings().create(new_training(enrollment.id)).await
}

/// A training with its three trackers, ordered by kind.
pub async fn seed_trackers(uow: &dyn UnitOfWork, student_id: &str) -> StoreResult<Vec<TrackerModel>> {
    let training = seed_training(uow, student_id).await?;
    uow.trackers()
        .create_batch(
            TrackerKind::ALL
                .iter()
                .map(|kind| NewTracker {
                    training_id: training.id,
                    kind: *kind,
                })
                .collect(),
        )
        .await
}
