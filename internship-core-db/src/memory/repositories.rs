use async_trait::async_trait;
use chrono::{DateTime, Utc};
use internship_core_api::{
    ApprovalStatus, PrincipalKind, PrincipalRef, PrincipalStatus, StudentId, TrackerKind,
    TrackerStatus,
};
use std::cmp::Reverse;

use super::store::{next_id, MemoryUnitOfWork};
use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repository::*;

fn prefer_active(candidates: Vec<PrincipalRecord>) -> Option<PrincipalRecord> {
    candidates.into_iter().max_by_key(|record| {
        let active = record.status() == PrincipalStatus::Active;
        (active, record.reference().id)
    })
}

#[async_trait]
impl PrincipalRepository for MemoryUnitOfWork {
    async fn find_student_by_student_id(
        &self,
        student_id: &StudentId,
    ) -> StoreResult<Option<StudentModel>> {
        let state = self.working.lock();
        Ok(state
            .students
            .values()
            .find(|s| &s.student_id == student_id)
            .cloned())
    }

    async fn find_by_email(
        &self,
        kind: PrincipalKind,
        email: &str,
    ) -> StoreResult<Option<PrincipalRecord>> {
        let state = self.working.lock();
        let candidates: Vec<PrincipalRecord> = match kind {
            PrincipalKind::Student => state
                .students
                .values()
                .filter(|s| s.email.eq_ignore_ascii_case(email))
                .cloned()
                .map(PrincipalRecord::Student)
                .collect(),
            PrincipalKind::SuperAdmin => state
                .super_admins
                .values()
                .filter(|a| a.email.eq_ignore_ascii_case(email))
                .cloned()
                .map(PrincipalRecord::SuperAdmin)
                .collect(),
        };
        Ok(prefer_active(candidates))
    }

    async fn find_by_ref(&self, principal: PrincipalRef) -> StoreResult<Option<PrincipalRecord>> {
        let state = self.working.lock();
        Ok(match principal.kind {
            PrincipalKind::Student => state
                .students
                .get(&principal.id)
                .cloned()
                .map(PrincipalRecord::Student),
            PrincipalKind::SuperAdmin => state
                .super_admins
                .get(&principal.id)
                .cloned()
                .map(PrincipalRecord::SuperAdmin),
        })
    }

    async fn create_student(&self, item: NewStudent) -> StoreResult<StudentModel> {
        let mut state = self.working.lock();
        if state.students.values().any(|s| s.student_id == item.student_id) {
            return Err(StoreError::DuplicateKey(format!(
                "users.student_id {}",
                item.student_id
            )));
        }
        let now = Utc::now();
        let model = StudentModel {
            id: next_id(&state.students),
            student_id: item.student_id,
            full_name: item.full_name,
            email: item.email,
            password_hash: item.password_hash,
            status: item.status,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.students.insert(model.id, model.clone());
        Ok(model)
    }

    async fn create_super_admin(&self, item: NewSuperAdmin) -> StoreResult<SuperAdminModel> {
        let mut state = self.working.lock();
        let now = Utc::now();
        let model = SuperAdminModel {
            id: next_id(&state.super_admins),
            full_name: item.full_name,
            email: item.email,
            password_hash: item.password_hash,
            status: item.status,
            abilities: item.abilities,
            email_verified_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.super_admins.insert(model.id, model.clone());
        Ok(model)
    }

    async fn touch_last_login(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.working.lock();
        match principal.kind {
            PrincipalKind::Student => {
                let row = state
                    .students
                    .get_mut(&principal.id)
                    .ok_or_else(|| StoreError::not_found("student", principal.id))?;
                row.last_login_at = Some(at);
            }
            PrincipalKind::SuperAdmin => {
                let row = state
                    .super_admins
                    .get_mut(&principal.id)
                    .ok_or_else(|| StoreError::not_found("super_admin", principal.id))?;
                row.last_login_at = Some(at);
            }
        }
        Ok(())
    }

    async fn update_password_hash(
        &self,
        principal: PrincipalRef,
        previous_hash: &str,
        new_hash: &str,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut state = self.working.lock();
        let (hash, updated_at) = match principal.kind {
            PrincipalKind::Student => state
                .students
                .get_mut(&principal.id)
                .map(|row| (&mut row.password_hash, &mut row.updated_at)),
            PrincipalKind::SuperAdmin => state
                .super_admins
                .get_mut(&principal.id)
                .map(|row| (&mut row.password_hash, &mut row.updated_at)),
        }
        .ok_or_else(|| StoreError::not_found("principal", principal))?;
        if hash.as_str() != previous_hash {
            return Err(StoreError::conflict("principal", principal));
        }
        *hash = new_hash.to_string();
        *updated_at = at;
        Ok(())
    }

    async fn mark_email_verified(&self, principal: PrincipalRef, at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.working.lock();
        let verified_at = match principal.kind {
            PrincipalKind::Student => state
                .students
                .get_mut(&principal.id)
                .map(|row| &mut row.email_verified_at),
            PrincipalKind::SuperAdmin => state
                .super_admins
                .get_mut(&principal.id)
                .map(|row| &mut row.email_verified_at),
        }
        .ok_or_else(|| StoreError::not_found("principal", principal))?;
        *verified_at = Some(at);
        Ok(())
    }
}

#[async_trait]
impl TokenRepository for MemoryUnitOfWork {
    async fn create(&self, item: TokenModel) -> StoreResult<TokenModel> {
        let mut state = self.working.lock();
        let key = item.token_id.as_str().to_string();
        if state.tokens.contains_key(&key) {
            return Err(StoreError::DuplicateKey(format!("access_tokens.token_id {key}")));
        }
        state.tokens.insert(key, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, token_id: &str) -> StoreResult<Option<TokenModel>> {
        Ok(self.working.lock().tokens.get(token_id).cloned())
    }

    async fn touch(&self, token_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(token) = self.working.lock().tokens.get_mut(token_id) {
            token.last_used_at = Some(at);
        }
        Ok(())
    }

    async fn revoke(&self, token_id: &str) -> StoreResult<bool> {
        Ok(match self.working.lock().tokens.get_mut(token_id) {
            Some(token) => {
                token.revoked = true;
                true
            }
            None => false,
        })
    }

    async fn revoke_if_live(&self, token_id: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        Ok(match self.working.lock().tokens.get_mut(token_id) {
            Some(token) if token.is_live(now) => {
                token.revoked = true;
                true
            }
            _ => false,
        })
    }

    async fn revoke_all(
        &self,
        principal: PrincipalRef,
        except: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<u64> {
        let mut state = self.working.lock();
        let mut affected = 0;
        for token in state.tokens.values_mut() {
            if token.principal == principal
                && token.is_live(now)
                && Some(token.token_id.as_str()) != except
            {
                token.revoked = true;
                token.expires_at = now;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete_expired_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.working.lock();
        let before = state.tokens.len();
        state.tokens.retain(|_, token| token.expires_at >= cutoff);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl EnrollmentRepository for MemoryUnitOfWork {
    async fn create(&self, item: NewEnrollment) -> StoreResult<EnrollmentModel> {
        let mut state = self.working.lock();
        if !state.students.contains_key(&item.student_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "student_enrolls.student_id {}",
                item.student_id
            )));
        }
        let model = EnrollmentModel {
            id: next_id(&state.enrollments),
            student_id: item.student_id,
            advisor_id: item.advisor_id,
            created_at: Utc::now(),
        };
        state.enrollments.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<EnrollmentModel>> {
        Ok(self.working.lock().enrollments.get(&id).cloned())
    }
}

#[async_trait]
impl ApprovalRepository for MemoryUnitOfWork {
    async fn create(&self, item: NewApproval) -> StoreResult<ApprovalModel> {
        let mut state = self.working.lock();
        if !state.enrollments.contains_key(&item.student_enroll_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "internship_approvals.student_enroll_id {}",
                item.student_enroll_id
            )));
        }
        if state
            .approvals
            .values()
            .any(|a| a.student_enroll_id == item.student_enroll_id)
        {
            return Err(StoreError::DuplicateKey(format!(
                "internship_approvals.student_enroll_id {}",
                item.student_enroll_id
            )));
        }
        let model = ApprovalModel {
            id: next_id(&state.approvals),
            student_enroll_id: item.student_enroll_id,
            student_id: item.student_id,
            status: ApprovalStatus::Registered,
            advisor_id: item.advisor_id,
            committee_id: item.committee_id,
            registered_at: item.registered_at,
            advisor_decided_at: None,
            committee_decided_at: None,
            withdrawn_at: None,
            advisor_reason: None,
            committee_reason: None,
            withdraw_reason: None,
            last_actor: None,
            version: 1,
            created_at: item.registered_at,
            updated_at: item.registered_at,
        };
        state.approvals.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<ApprovalModel>> {
        Ok(self.working.lock().approvals.get(&id).cloned())
    }

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<ApprovalModel>> {
        let state = self.working.lock();
        Ok(state
            .approvals
            .values()
            .find(|a| a.student_enroll_id == student_enroll_id)
            .cloned())
    }

    async fn update(&self, item: &ApprovalModel) -> StoreResult<ApprovalModel> {
        let mut state = self.working.lock();
        let stored = state
            .approvals
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::not_found("approval", item.id))?;
        if stored.version != item.version {
            return Err(StoreError::conflict("approval", item.id));
        }
        let mut updated = item.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn list(&self, filter: ApprovalFilter, page: PageRequest) -> StoreResult<Page<ApprovalModel>> {
        let state = self.working.lock();
        let mut rows: Vec<ApprovalModel> = state
            .approvals
            .values()
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .filter(|a| filter.student_id.map_or(true, |s| a.student_id == s))
            .filter(|a| filter.committee_id.map_or(true, |c| a.committee_id == Some(c)))
            .filter(|a| {
                filter.advisor_id.map_or(true, |advisor| {
                    state
                        .enrollments
                        .get(&a.student_enroll_id)
                        .is_some_and(|e| e.advisor_id == Some(advisor))
                })
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| Reverse((a.created_at, a.id)));
        Ok(Page::from_sorted(rows, page))
    }

    async fn append_transition(
        &self,
        item: NewApprovalTransition,
    ) -> StoreResult<ApprovalTransitionModel> {
        let mut state = self.working.lock();
        let model = ApprovalTransitionModel {
            id: state.transitions.len() as i64 + 1,
            approval_id: item.approval_id,
            action: item.action,
            from_status: item.from_status,
            to_status: item.to_status,
            actor: item.actor,
            reason: item.reason,
            created_at: item.created_at,
        };
        state.transitions.push(model.clone());
        Ok(model)
    }

    async fn history(&self, approval_id: i64) -> StoreResult<Vec<ApprovalTransitionModel>> {
        let state = self.working.lock();
        Ok(state
            .transitions
            .iter()
            .filter(|t| t.approval_id == approval_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TrainingRepository for MemoryUnitOfWork {
    async fn create(&self, item: NewTraining) -> StoreResult<TrainingModel> {
        let mut state = self.working.lock();
        if !state.enrollments.contains_key(&item.student_enroll_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "student_trainings.student_enroll_id {}",
                item.student_enroll_id
            )));
        }
        if state
            .trainings
            .values()
            .any(|t| t.student_enroll_id == item.student_enroll_id)
        {
            return Err(StoreError::DuplicateKey(format!(
                "student_trainings.student_enroll_id {}",
                item.student_enroll_id
            )));
        }
        let model = TrainingModel {
            id: next_id(&state.trainings),
            student_enroll_id: item.student_enroll_id,
            company_id: item.company_id,
            start_date: item.start_date,
            end_date: item.end_date,
            coordinator: item.coordinator,
            supervisor: item.supervisor,
            position: item.position,
            department: item.department,
            job_description: item.job_description,
            document_language: item.document_language,
            created_at: Utc::now(),
        };
        state.trainings.insert(model.id, model.clone());
        Ok(model)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrainingModel>> {
        Ok(self.working.lock().trainings.get(&id).cloned())
    }

    async fn find_by_enrollment(&self, student_enroll_id: i64) -> StoreResult<Option<TrainingModel>> {
        let state = self.working.lock();
        Ok(state
            .trainings
            .values()
            .find(|t| t.student_enroll_id == student_enroll_id)
            .cloned())
    }
}

fn due_order(tracker: &TrackerModel) -> (bool, Option<DateTime<Utc>>, i64) {
    (tracker.due_at.is_none(), tracker.due_at, tracker.id)
}

#[async_trait]
impl TrackerRepository for MemoryUnitOfWork {
    async fn create_batch(&self, items: Vec<NewTracker>) -> StoreResult<Vec<TrackerModel>> {
        let mut state = self.working.lock();
        let now = Utc::now();
        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            if !state.trainings.contains_key(&item.training_id) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "evaluation_status_trackers.training_id {}",
                    item.training_id
                )));
            }
            if state
                .trackers
                .values()
                .any(|t| t.training_id == item.training_id && t.kind == item.kind)
            {
                return Err(StoreError::DuplicateKey(format!(
                    "evaluation_status_trackers ({}, {})",
                    item.training_id, item.kind
                )));
            }
            let model = TrackerModel {
                id: next_id(&state.trackers),
                training_id: item.training_id,
                kind: item.kind,
                evaluator: None,
                due_at: None,
                status: TrackerStatus::Pending,
                remarks: None,
                assigned_at: None,
                completed_at: None,
                version: 1,
                created_at: now,
                updated_at: now,
            };
            state.trackers.insert(model.id, model.clone());
            saved.push(model);
        }
        Ok(saved)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<TrackerModel>> {
        Ok(self.working.lock().trackers.get(&id).cloned())
    }

    async fn find_by_training(&self, training_id: i64) -> StoreResult<Vec<TrackerModel>> {
        let state = self.working.lock();
        let mut rows: Vec<TrackerModel> = state
            .trackers
            .values()
            .filter(|t| t.training_id == training_id)
            .cloned()
            .collect();
        rows.sort_by_key(|t| t.kind);
        Ok(rows)
    }

    async fn find_by_training_and_kind(
        &self,
        training_id: i64,
        kind: TrackerKind,
    ) -> StoreResult<Option<TrackerModel>> {
        let state = self.working.lock();
        Ok(state
            .trackers
            .values()
            .find(|t| t.training_id == training_id && t.kind == kind)
            .cloned())
    }

    async fn update(&self, item: &TrackerModel) -> StoreResult<TrackerModel> {
        let mut state = self.working.lock();
        let stored = state
            .trackers
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::not_found("tracker", item.id))?;
        if stored.version != item.version {
            return Err(StoreError::conflict("tracker", item.id));
        }
        let mut updated = item.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    async fn mark_overdue(&self, now: DateTime<Utc>) -> StoreResult<Vec<TrackerModel>> {
        let mut state = self.working.lock();
        let mut promoted = Vec::new();
        for tracker in state.trackers.values_mut() {
            let due = tracker.due_at.is_some_and(|due| due < now);
            if due && tracker.status.is_sweepable() {
                tracker.status = TrackerStatus::Overdue;
                tracker.version += 1;
                tracker.updated_at = now;
                promoted.push(tracker.clone());
            }
        }
        Ok(promoted)
    }

    async fn list_by_evaluator(
        &self,
        evaluator: PrincipalRef,
        page: PageRequest,
    ) -> StoreResult<Page<TrackerModel>> {
        let state = self.working.lock();
        let mut rows: Vec<TrackerModel> = state
            .trackers
            .values()
            .filter(|t| t.evaluator == Some(evaluator))
            .cloned()
            .collect();
        rows.sort_by_key(due_order);
        Ok(Page::from_sorted(rows, page))
    }

    async fn list(&self, filter: TrackerFilter, page: PageRequest) -> StoreResult<Page<TrackerModel>> {
        let state = self.working.lock();
        let mut rows: Vec<TrackerModel> = state
            .trackers
            .values()
            .filter(|t| filter.kind.map_or(true, |k| t.kind == k))
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        rows.sort_by_key(due_order);
        Ok(Page::from_sorted(rows, page))
    }

    async fn count_by_kind_and_status(&self) -> StoreResult<Vec<TrackerCount>> {
        let state = self.working.lock();
        let mut counts: std::collections::BTreeMap<(TrackerKind, TrackerStatus), i64> =
            std::collections::BTreeMap::new();
        for tracker in state.trackers.values() {
            *counts.entry((tracker.kind, tracker.status)).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|((kind, status), count)| TrackerCount { kind, status, count })
            .collect())
    }
}

#[async_trait]
impl AuditRepository for MemoryUnitOfWork {
    async fn append(&self, item: AuditEntryModel) -> StoreResult<()> {
        self.working.lock().audit.push(item);
        Ok(())
    }

    async fn find_by_subject(
        &self,
        subject_kind: &str,
        subject_id: &str,
    ) -> StoreResult<Vec<AuditEntryModel>> {
        let state = self.working.lock();
        Ok(state
            .audit
            .iter()
            .filter(|e| e.subject_kind == subject_kind && e.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.working.lock();
        let before = state.audit.len();
        state.audit.retain(|e| e.created_at >= cutoff);
        Ok((before - state.audit.len()) as u64)
    }
}

#[async_trait]
impl NotificationRepository for MemoryUnitOfWork {
    async fn enqueue(&self, item: NotificationModel) -> StoreResult<()> {
        self.working.lock().notifications.push(item);
        Ok(())
    }

    async fn find_by_recipient(&self, recipient: PrincipalRef) -> StoreResult<Vec<NotificationModel>> {
        let state = self.working.lock();
        let mut rows: Vec<NotificationModel> = state
            .notifications
            .iter()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect();
        rows.reverse();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::Duration;

    fn student(student_id: &str) -> NewStudent {
        NewStudent {
            student_id: student_id.parse().unwrap(),
            full_name: "Test Student".to_string(),
            email: format!("{student_id}@x.edu"),
            password_hash: "hash".to_string(),
            status: PrincipalStatus::Active,
        }
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let uow = store.begin().await.unwrap();
        uow.principals().create_student(student("65130001")).await.unwrap();
        tokio_test::assert_ok!(uow.rollback().await);

        let uow = store.begin().await.unwrap();
        let found = uow
            .principals()
            .find_student_by_student_id(&"65130001".parse().unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        let uow = store.begin().await.unwrap();
        uow.principals().create_student(student("65130001")).await.unwrap();
        uow.commit().await.unwrap();

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.students.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_student_id_is_rejected() {
        let store = MemoryStore::new();
        let uow = store.begin().await.unwrap();
        uow.principals().create_student(student("65130001")).await.unwrap();
        let err = uow
            .principals()
            .create_student(student("65130001"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey(_)));
    }

    #[tokio::test]
    async fn test_stale_version_conflicts() {
        let store = MemoryStore::new();
        let uow = store.begin().await.unwrap();
        let s = uow.principals().create_student(student("65130001")).await.unwrap();
        let e = uow
            .enrollments()
            .create(NewEnrollment { student_id: s.id, advisor_id: Some(42) })
            .await
            .unwrap();
        let approval = uow
            .approvals()
            .create(NewApproval {
                student_enroll_id: e.id,
                student_id: s.id,
                advisor_id: Some(42),
                committee_id: None,
                registered_at: Utc::now(),
            })
            .await
            .unwrap();

        let updated = uow.approvals().update(&approval).await.unwrap();
        assert_eq!(updated.version, approval.version + 1);
        let err = uow.approvals().update(&approval).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_revoke_all_spares_exception() {
        let store = MemoryStore::new();
        let uow = store.begin().await.unwrap();
        let now = Utc::now();
        let principal = PrincipalRef::student(1);
        for id in ["a", "b", "c"] {
            uow.tokens()
                .create(TokenModel {
                    token_id: id.parse().unwrap(),
                    token_hash: format!("hash-{id}"),
                    principal,
                    purpose: internship_core_api::TokenPurpose::Access,
                    abilities: vec![],
                    device: None,
                    issued_at: now,
                    expires_at: now + Duration::minutes(15),
                    last_used_at: None,
                    revoked: false,
                })
                .await
                .unwrap();
        }
        let affected = uow.tokens().revoke_all(principal, Some("b"), now).await.unwrap();
        assert_eq!(affected, 2);
        assert!(uow.tokens().find_by_id("b").await.unwrap().unwrap().is_live(now));
        assert!(!uow.tokens().find_by_id("a").await.unwrap().unwrap().is_live(now));
        assert!(!uow.tokens().revoke_if_live("a", now).await.unwrap());
        assert!(uow.tokens().revoke_if_live("b", now).await.unwrap());
    }
}
