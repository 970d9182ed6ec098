pub mod create;
pub mod find_by_id;
pub mod list;
pub mod repo_impl;
pub mod transitions;
pub mod update;

pub use repo_impl::ApprovalRepositoryImpl;
