pub mod create;
pub mod find;
pub mod list;
pub mod repo_impl;
pub mod update;

pub use repo_impl::TrackerRepositoryImpl;
