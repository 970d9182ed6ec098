//! Approval workflow.
//!
//! ```text
//! registered --advisor_approve--> advisor_approved --committee_approve--> approved
//!     |                                 |
//!     +--advisor_reject--> rejected <---+--committee_reject
//!
//! registered | advisor_approved --withdraw--> withdrawn
//! ```
//!
//! Writes are version-checked; a lost race surfaces as `Conflict` and is left
//! to the caller.

mod engine;
mod guard;
mod transition;

pub use engine::ApprovalEngine;
