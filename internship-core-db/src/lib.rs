pub mod error;
pub mod models;
pub mod repository;
pub mod utils;

#[cfg(feature = "memory")]
pub mod memory;

pub use error::*;
