use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    PasswordReset,
    EmailVerify,
    ApprovalDecision,
    EvaluatorAssigned,
    EvaluationOverdue,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::PasswordReset => "password_reset",
            NotificationCategory::EmailVerify => "email_verify",
            NotificationCategory::ApprovalDecision => "approval_decision",
            NotificationCategory::EvaluatorAssigned => "evaluator_assigned",
            NotificationCategory::EvaluationOverdue => "evaluation_overdue",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
