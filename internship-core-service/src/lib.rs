pub mod approval;
pub mod audit;
pub mod auth;
pub mod clock;
pub mod context;
pub mod evaluation;
pub mod outbox;
pub mod paging;
pub mod settings;
pub mod sweep;

pub use approval::ApprovalEngine;
pub use audit::{AuditEvent, AuditWriter};
pub use auth::{AuthService, LoginResult, Session};
pub use clock::{Clock, ManualClock, SystemClock};
pub use context::RequestContext;
pub use evaluation::{EvaluationTracker, TrainingSummary};
pub use outbox::{Courier, NullCourier, Outbox};
pub use settings::{AuthSettings, SweepSettings};
pub use sweep::{SweepKind, SweepOutcome, Sweeper};

#[cfg(test)]
pub(crate) mod test_support;
