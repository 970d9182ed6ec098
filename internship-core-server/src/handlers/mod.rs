pub mod approvals;
pub mod auth;
pub mod evaluations;
pub mod health;
