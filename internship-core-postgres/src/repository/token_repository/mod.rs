pub mod cleanup;
pub mod create;
pub mod find_by_id;
pub mod repo_impl;
pub mod revoke;

pub use repo_impl::TokenRepositoryImpl;
