mod faulty;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use internship_core_api::{
    ApprovalStatus, NotificationCategory, PrincipalRef, PrincipalStatus, TokenPurpose,
    STUDENT_ABILITIES,
};
use internship_core_db::memory::MemoryStore;
use internship_core_db::models::{ApprovalModel, EnrollmentModel, StudentModel, SuperAdminModel};
use parking_lot::Mutex;

use crate::auth::Session;
use crate::clock::ManualClock;
use crate::outbox::Courier;
use crate::settings::AuthSettings;
use crate::AuthService;

pub use faulty::{Fault, FaultyStore};

pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";
pub const TEST_COST: u32 = 4;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

pub fn test_settings() -> AuthSettings {
    AuthSettings {
        bcrypt_cost: TEST_COST,
        ..AuthSettings::new(TEST_SECRET)
    }
}

/// Keeps every bearer handed to it.
#[derive(Default)]
pub struct CapturingCourier {
    delivered: Mutex<Vec<(PrincipalRef, NotificationCategory, String, String)>>,
}

impl CapturingCourier {
    pub fn last_bearer(&self) -> Option<String> {
        self.delivered.lock().last().map(|(_, _, _, bearer)| bearer.clone())
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().len()
    }
}

impl Courier for CapturingCourier {
    fn deliver(&self, recipient: PrincipalRef, category: NotificationCategory, token_id: &str, bearer: &str) {
        self.delivered
            .lock()
            .push((recipient, category, token_id.to_string(), bearer.to_string()));
    }
}

pub struct Harness {
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
    pub courier: Arc<CapturingCourier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: MemoryStore::new(),
            clock: Arc::new(ManualClock::new(epoch())),
            courier: Arc::new(CapturingCourier::default()),
        }
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(Arc::new(self.store.clone()), self.clock.clone(), test_settings())
            .unwrap()
            .with_courier(self.courier.clone())
    }

    /// A store over the rows of [`Harness::store`] with `fault` injected.
    pub fn faulty(&self, fault: Fault) -> Arc<FaultyStore> {
        Arc::new(FaultyStore::new(self.store.clone(), fault))
    }

    pub async fn seed_student(&self, id: i64, student_id: &str, email: &str, password: &str) -> PrincipalRef {
        let hash = bcrypt::hash(password, TEST_COST).unwrap();
        let now = epoch();
        self.store
            .with_state(|state| {
                state.students.insert(
                    id,
                    StudentModel {
                        id,
                        student_id: student_id.parse().unwrap(),
                        full_name: format!("Student {id}"),
                        email: email.to_string(),
                        password_hash: hash,
                        status: PrincipalStatus::Active,
                        email_verified_at: None,
                        last_login_at: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
            })
            .await;
        PrincipalRef::student(id)
    }

    pub async fn seed_admin(&self, id: i64, email: &str, password: &str, abilities: &[&str]) -> PrincipalRef {
        let hash = bcrypt::hash(password, TEST_COST).unwrap();
        let now = epoch();
        self.store
            .with_state(|state| {
                state.super_admins.insert(
                    id,
                    SuperAdminModel {
                        id,
                        full_name: format!("Admin {id}"),
                        email: email.to_string(),
                        password_hash: hash,
                        status: PrincipalStatus::Active,
                        abilities: abilities.iter().map(|a| a.to_string()).collect(),
                        email_verified_at: None,
                        last_login_at: None,
                        created_at: now,
                        updated_at: now,
                    },
                );
            })
            .await;
        PrincipalRef::super_admin(id)
    }

    pub async fn set_status(&self, principal: PrincipalRef, status: PrincipalStatus) {
        self.store
            .with_state(|state| {
                if let Some(student) = state.students.get_mut(&principal.id) {
                    student.status = status;
                }
            })
            .await;
    }

    pub async fn seed_enrollment(&self, id: i64, student: i64, advisor: Option<i64>) {
        self.store
            .with_state(|state| {
                state.enrollments.insert(
                    id,
                    EnrollmentModel {
                        id,
                        student_id: student,
                        advisor_id: advisor,
                        created_at: epoch(),
                    },
                );
            })
            .await;
    }

    /// Seeds an enrollment with the same id and its approval.
    pub async fn seed_approval(
        &self,
        id: i64,
        student: i64,
        advisor: Option<i64>,
        committee: Option<i64>,
        status: ApprovalStatus,
    ) {
        self.seed_enrollment(id, student, advisor).await;
        self.store
            .with_state(|state| {
                state.approvals.insert(
                    id,
                    ApprovalModel {
                        id,
                        student_enroll_id: id,
                        student_id: student,
                        status,
                        advisor_id: advisor,
                        committee_id: committee,
                        registered_at: epoch(),
                        advisor_decided_at: None,
                        committee_decided_at: None,
                        withdrawn_at: None,
                        advisor_reason: None,
                        committee_reason: None,
                        withdraw_reason: None,
                        last_actor: None,
                        version: 1,
                        created_at: epoch(),
                        updated_at: epoch(),
                    },
                );
            })
            .await;
    }

    pub async fn audit_actions(&self) -> Vec<String> {
        self.store
            .snapshot()
            .await
            .audit
            .into_iter()
            .map(|entry| entry.action)
            .collect()
    }
}

/// A session that never went through a token, for engine tests.
pub fn session(principal: PrincipalRef, abilities: &[&str]) -> Session {
    Session {
        principal,
        abilities: abilities.iter().map(|a| a.to_string()).collect(),
        token_id: format!("{:032x}", principal.id),
        purpose: TokenPurpose::Access,
        device: None,
        expires_at: epoch() + chrono::Duration::hours(1),
    }
}

pub fn student_session(id: i64) -> Session {
    session(PrincipalRef::student(id), STUDENT_ABILITIES)
}
