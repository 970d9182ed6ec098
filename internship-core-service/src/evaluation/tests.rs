use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use internship_core_api::{
    ApprovalStatus, ContactBlock, CoreError, DocumentLanguage, EvaluationListQuery, OverallStatus,
    PrincipalRef, RegisterTrainingRequest, TrackerKind, TrackerStatus, ABILITY_ALL,
    ABILITY_EVALUATIONS_READ, ABILITY_EVALUATIONS_SUBMIT,
};
use internship_core_db::repository::PageRequest;
use rust_decimal::Decimal;

use super::EvaluationTracker;
use crate::auth::Session;
use crate::context::RequestContext;
use crate::test_support::{epoch, session, student_session, Fault, Harness};

fn tracker(harness: &Harness) -> EvaluationTracker {
    EvaluationTracker::new(Arc::new(harness.store.clone()), harness.clock.clone())
}

fn admin() -> Session {
    session(PrincipalRef::super_admin(1), &[ABILITY_ALL])
}

fn visitor(id: i64) -> Session {
    session(
        PrincipalRef::super_admin(id),
        &[ABILITY_EVALUATIONS_READ, ABILITY_EVALUATIONS_SUBMIT],
    )
}

fn contact(name: &str) -> ContactBlock {
    ContactBlock {
        name: name.to_string(),
        phone: None,
        email: None,
        position: None,
    }
}

fn training_request(enrollment: i64) -> RegisterTrainingRequest {
    RegisterTrainingRequest {
        student_enroll_id: enrollment,
        company_id: 3,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 9, 30).unwrap(),
        coordinator: contact("Coordinator"),
        supervisor: contact("Supervisor"),
        position: "Backend intern".to_string(),
        department: Some("Platform".to_string()),
        job_description: None,
        document_language: DocumentLanguage::En,
    }
}

/// Student 1 with an approved enrollment 11, a visiting instructor 60.
async fn seeded() -> Harness {
    let harness = Harness::new();
    harness.seed_student(1, "65130001", "a@x.edu", "Passw0rd!").await;
    harness
        .seed_admin(60, "visitor@x.edu", "Passw0rd!", &[ABILITY_EVALUATIONS_READ])
        .await;
    harness
        .seed_approval(11, 1, Some(42), Some(55), ApprovalStatus::Approved)
        .await;
    harness
}

async fn tracker_id(harness: &Harness, training_id: i64, kind: TrackerKind) -> i64 {
    harness
        .store
        .snapshot()
        .await
        .trackers
        .values()
        .find(|t| t.training_id == training_id && t.kind == kind)
        .map(|t| t.id)
        .unwrap()
}

#[tokio::test]
async fn test_tracker_lifecycle() {
    let harness = seeded().await;
    let tracker = tracker(&harness);
    let ctx = RequestContext::background();

    let training = tracker
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap();
    let summary = tracker.summary(&ctx, &admin(), training.id).await.unwrap();
    let kinds: Vec<_> = summary.trackers.iter().map(|t| t.kind).collect();
    assert_eq!(kinds, TrackerKind::ALL.to_vec());
    assert!(summary.trackers.iter().all(|t| t.status == TrackerStatus::Pending));
    assert_eq!(summary.overall_status, OverallStatus::Pending);

    let company = tracker_id(&harness, training.id, TrackerKind::StudentCompany).await;
    let yesterday = epoch() - Duration::days(1);
    let assigned = tracker
        .assign(&ctx, &admin(), company, 1, Some(yesterday))
        .await
        .unwrap();
    assert_eq!(assigned.status, TrackerStatus::InProgress);
    assert_eq!(assigned.evaluator, Some(PrincipalRef::student(1)));

    let promoted = tracker.sweep_overdue(&ctx, &admin()).await.unwrap();
    assert_eq!(promoted.len(), 1);
    assert_eq!(promoted[0].status, TrackerStatus::Overdue);
    assert!(tracker.sweep_overdue(&ctx, &admin()).await.unwrap().is_empty());

    let summary = tracker.summary(&ctx, &student_session(1), training.id).await.unwrap();
    assert_eq!(summary.overall_status, OverallStatus::HasOverdue);

    let completed = tracker
        .mark_completed(&ctx, &student_session(1), training.id, TrackerKind::StudentCompany, None)
        .await
        .unwrap();
    assert_eq!(completed.status, TrackerStatus::Completed);
    assert!(completed.completed_at.is_some());
    assert_eq!(completed.remarks, None);

    let summary = tracker.summary(&ctx, &admin(), training.id).await.unwrap();
    assert_eq!(summary.completion_rate, Decimal::from_str("33.33").unwrap());
    assert_eq!(summary.overall_status, OverallStatus::Pending);

    let err = tracker
        .mark_completed(&ctx, &admin(), training.id, TrackerKind::StudentCompany, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::AlreadyFinal(_)));

    let state = harness.store.snapshot().await;
    let categories: Vec<_> = state.notifications.iter().map(|n| n.category.as_str()).collect();
    assert_eq!(categories, vec!["evaluator_assigned", "evaluation_overdue"]);
}

#[tokio::test]
async fn test_training_requires_an_approved_enrollment() {
    let harness = seeded().await;
    harness
        .seed_approval(12, 1, Some(42), None, ApprovalStatus::AdvisorApproved)
        .await;
    harness.seed_enrollment(13, 1, None).await;
    let tracker = tracker(&harness);
    let ctx = RequestContext::background();

    for enrollment in [12, 13] {
        let err = tracker
            .register_training(&ctx, &student_session(1), training_request(enrollment))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::IllegalTransition { .. }));
    }

    tracker
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap();
    let err = tracker
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateKey(_)));
    assert_eq!(harness.store.snapshot().await.trackers.len(), 3);
}

#[tokio::test]
async fn test_reversed_period_is_rejected() {
    let harness = seeded().await;
    let tracker = tracker(&harness);
    let mut request = training_request(11);
    std::mem::swap(&mut request.start_date, &mut request.end_date);

    let err = tracker
        .register_training(&RequestContext::background(), &student_session(1), request)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_visitor_kinds_need_staff_evaluators() {
    let harness = seeded().await;
    let tracker = tracker(&harness);
    let ctx = RequestContext::background();
    let training = tracker
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap();
    let visit = tracker_id(&harness, training.id, TrackerKind::VisitorStudent).await;

    let err = tracker.assign(&ctx, &admin(), visit, 1, None).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }));

    let err = tracker.assign(&ctx, &visitor(60), visit, 60, None).await.unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));

    tracker.assign(&ctx, &admin(), visit, 60, None).await.unwrap();
    let mine = tracker
        .assignments(&ctx, &visitor(60), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(mine.items.iter().map(|t| t.id).collect::<Vec<_>>(), vec![visit]);

    let err = tracker
        .complete(&ctx, &student_session(1), visit, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
    let done = tracker
        .complete(&ctx, &visitor(60), visit, Some("Site visit on 12 August".to_string()))
        .await
        .unwrap();
    assert_eq!(done.status, TrackerStatus::Completed);
    assert_eq!(done.remarks.as_deref(), Some("Site visit on 12 August"));

    let stored = harness.store.snapshot().await.trackers[&visit].clone();
    assert_eq!(stored.remarks.as_deref(), Some("Site visit on 12 August"));
    assert_eq!(stored.version, done.version);
}

#[tokio::test]
async fn test_listings_and_stats() {
    let harness = seeded().await;
    let tracker = tracker(&harness);
    let ctx = RequestContext::background();
    let training = tracker
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap();
    let company = tracker_id(&harness, training.id, TrackerKind::StudentCompany).await;
    tracker
        .assign(&ctx, &admin(), company, 1, Some(epoch() - Duration::hours(1)))
        .await
        .unwrap();
    tracker.sweep_overdue(&ctx, &admin()).await.unwrap();

    let overdue = tracker
        .list_overdue(&ctx, &admin(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(overdue.total, 1);

    let query = EvaluationListQuery {
        kind: Some(TrackerKind::VisitorCompany),
        ..Default::default()
    };
    assert_eq!(tracker.list_by_kind(&ctx, &admin(), &query).await.unwrap().total, 1);

    let stats = tracker.stats(&ctx, &admin()).await.unwrap();
    let pending: i64 = stats
        .iter()
        .filter(|c| c.status == TrackerStatus::Pending)
        .map(|c| c.count)
        .sum();
    assert_eq!(pending, 2);

    let err = tracker.stats(&ctx, &student_session(1)).await.unwrap_err();
    assert!(matches!(err, CoreError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_stale_tracker_write_is_a_conflict() {
    let harness = seeded().await;
    let ctx = RequestContext::background();
    let training = tracker(&harness)
        .register_training(&ctx, &student_session(1), training_request(11))
        .await
        .unwrap();
    let company = tracker_id(&harness, training.id, TrackerKind::StudentCompany).await;

    let racing = EvaluationTracker::new(harness.faulty(Fault::StaleVersion), harness.clock.clone());
    let err = racing.assign(&ctx, &admin(), company, 1, None).await.unwrap_err();
    assert!(matches!(err, CoreError::Conflict(_)));

    let stored = harness.store.snapshot().await.trackers[&company].clone();
    assert_eq!(stored.status, TrackerStatus::Pending);
    assert_eq!(stored.evaluator, None);
}
