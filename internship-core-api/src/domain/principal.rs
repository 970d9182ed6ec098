use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Maximum length of the external student identifier.
pub const STUDENT_ID_MAX_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "principal_kind", rename_all = "snake_case"))]
pub enum PrincipalKind {
    Student,
    SuperAdmin,
}

impl PrincipalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalKind::Student => "student",
            PrincipalKind::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrincipalKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(PrincipalKind::Student),
            "super_admin" => Ok(PrincipalKind::SuperAdmin),
            other => Err(CoreError::MalformedRequest(format!(
                "unknown principal kind '{other}'"
            ))),
        }
    }
}

/// Tagged reference to a principal. Tokens, audit entries and evaluator
/// assignments always store both halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalRef {
    pub kind: PrincipalKind,
    pub id: i64,
}

impl PrincipalRef {
    pub fn new(kind: PrincipalKind, id: i64) -> Self {
        Self { kind, id }
    }

    pub fn student(id: i64) -> Self {
        Self::new(PrincipalKind::Student, id)
    }

    pub fn super_admin(id: i64) -> Self {
        Self::new(PrincipalKind::SuperAdmin, id)
    }

    /// Subject string embedded in signed bearers, e.g. `student:12`.
    pub fn subject(&self) -> String {
        format!("{}:{}", self.kind, self.id)
    }

    pub fn parse_subject(subject: &str) -> Option<Self> {
        let (kind, id) = subject.split_once(':')?;
        let kind = PrincipalKind::from_str(kind).ok()?;
        let id = id.parse().ok()?;
        Some(Self { kind, id })
    }
}

impl fmt::Display for PrincipalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "principal_status", rename_all = "snake_case"))]
pub enum PrincipalStatus {
    Active,
    Inactive,
    Suspended,
}

impl PrincipalStatus {
    /// Maps the legacy boolean `is_active` flag onto the normalised status.
    pub fn from_legacy_flag(is_active: bool) -> Self {
        if is_active {
            PrincipalStatus::Active
        } else {
            PrincipalStatus::Inactive
        }
    }
}

/// The external student identifier: 1 to 11 ASCII digits, immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StudentId(HeaplessString<STUDENT_ID_MAX_LEN>);

impl StudentId {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for StudentId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::validation("student_id", "must contain digits only"));
        }
        HeaplessString::from_str(s).map(StudentId).map_err(|_| {
            CoreError::validation(
                "student_id",
                format!("must be at most {STUDENT_ID_MAX_LEN} digits"),
            )
        })
    }
}

impl TryFrom<String> for StudentId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StudentId> for String {
    fn from(value: StudentId) -> Self {
        value.0.as_str().to_string()
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public projection of a principal. Never carries password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub kind: PrincipalKind,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub full_name: String,
    pub email: String,
    pub status: PrincipalStatus,
    pub email_verified: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl PrincipalView {
    pub fn reference(&self) -> PrincipalRef {
        PrincipalRef::new(self.kind, self.id)
    }
}

/// Kind-specific lookup key presented at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    StudentId(StudentId),
    Email(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_id_accepts_digits() {
        let id: StudentId = "65130001".parse().unwrap();
        assert_eq!(id.as_str(), "65130001");
        assert!("65130001234".parse::<StudentId>().is_ok());
    }

    #[test]
    fn test_student_id_rejects_bad_input() {
        assert!("".parse::<StudentId>().is_err());
        assert!("6513A001".parse::<StudentId>().is_err());
        assert!("651300012345".parse::<StudentId>().is_err());
    }

    #[test]
    fn test_subject_round_trip() {
        let principal = PrincipalRef::super_admin(42);
        assert_eq!(principal.subject(), "super_admin:42");
        assert_eq!(PrincipalRef::parse_subject("super_admin:42"), Some(principal));
        assert_eq!(PrincipalRef::parse_subject("teacher:42"), None);
        assert_eq!(PrincipalRef::parse_subject("student:x"), None);
    }

    #[test]
    fn test_principal_view_uses_camel_case() {
        let view = PrincipalView {
            kind: PrincipalKind::Student,
            id: 1,
            student_id: Some("65130001".to_string()),
            full_name: "Ann".to_string(),
            email: "a@x.edu".to_string(),
            status: PrincipalStatus::Active,
            email_verified: false,
            last_login_at: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["studentId"], "65130001");
        assert_eq!(json["kind"], "student");
        assert!(json.get("password_hash").is_none());
    }
}
