pub mod create;
pub mod find;
pub mod repo_impl;
pub mod update_credentials;

pub use repo_impl::PrincipalRepositoryImpl;
