use chrono::{DateTime, Utc};
use internship_core_api::{
    PrincipalKind, PrincipalRef, PrincipalStatus, PrincipalView, StudentId, STUDENT_ABILITIES,
};
use serde::{Deserialize, Serialize};

/// # Documentation
/// - Row of the `users` table.
/// - `student_id` is the external identifier and never changes; `id` is the internal key
///   referenced by tokens, enrollments and evaluator assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentModel {
    pub id: i64,
    pub student_id: StudentId,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: PrincipalStatus,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// # Documentation
/// - Row of the `super_admins` table: administrators, advisors, committee members and
///   visiting instructors.
/// - `abilities` is granted verbatim to every token issued on login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperAdminModel {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: PrincipalStatus,
    pub abilities: Vec<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStudent {
    pub student_id: StudentId,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: PrincipalStatus,
}

#[derive(Debug, Clone)]
pub struct NewSuperAdmin {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub status: PrincipalStatus,
    pub abilities: Vec<String>,
}

/// A principal loaded from either table.
#[derive(Debug, Clone, PartialEq)]
pub enum PrincipalRecord {
    Student(StudentModel),
    SuperAdmin(SuperAdminModel),
}

impl PrincipalRecord {
    pub fn reference(&self) -> PrincipalRef {
        match self {
            PrincipalRecord::Student(s) => PrincipalRef::new(PrincipalKind::Student, s.id),
            PrincipalRecord::SuperAdmin(a) => PrincipalRef::new(PrincipalKind::SuperAdmin, a.id),
        }
    }

    pub fn status(&self) -> PrincipalStatus {
        match self {
            PrincipalRecord::Student(s) => s.status,
            PrincipalRecord::SuperAdmin(a) => a.status,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            PrincipalRecord::Student(s) => &s.email,
            PrincipalRecord::SuperAdmin(a) => &a.email,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            PrincipalRecord::Student(s) => &s.password_hash,
            PrincipalRecord::SuperAdmin(a) => &a.password_hash,
        }
    }

    /// Abilities granted to access and refresh tokens for this principal.
    pub fn abilities(&self) -> Vec<String> {
        match self {
            PrincipalRecord::Student(_) => STUDENT_ABILITIES.iter().map(|a| a.to_string()).collect(),
            PrincipalRecord::SuperAdmin(a) => a.abilities.clone(),
        }
    }

    pub fn view(&self) -> PrincipalView {
        match self {
            PrincipalRecord::Student(s) => PrincipalView {
                kind: PrincipalKind::Student,
                id: s.id,
                student_id: Some(s.student_id.to_string()),
                full_name: s.full_name.clone(),
                email: s.email.clone(),
                status: s.status,
                email_verified: s.email_verified_at.is_some(),
                last_login_at: s.last_login_at,
            },
            PrincipalRecord::SuperAdmin(a) => PrincipalView {
                kind: PrincipalKind::SuperAdmin,
                id: a.id,
                student_id: None,
                full_name: a.full_name.clone(),
                email: a.email.clone(),
                status: a.status,
                email_verified: a.email_verified_at.is_some(),
                last_login_at: a.last_login_at,
            },
        }
    }
}
