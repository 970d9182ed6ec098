pub mod executor;
pub mod migrate;
pub mod repository;
pub mod store;
pub mod utils;

pub use executor::Executor;
pub use store::{DbLogLevel, PgStore, PgStoreConfig, PgUnitOfWork};

#[cfg(test)]
pub mod test_helper;
